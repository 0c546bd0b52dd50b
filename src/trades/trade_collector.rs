use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::constants::ROUNDING_SCALE;
use crate::errors::{CalculatorError, Result};
use crate::fx::CurrencyConverterTrait;
use crate::money::Money;
use crate::securities::Security;
use crate::trades::trades_model::{Trade, TradeTransaction};
use crate::transactions::{sort_chronologically, QuoteProviderTrait, Transaction};

/// Segments a security's transaction history into discrete trades.
///
/// A trade begins when the net position leaves zero and ends when it returns
/// to zero. The net position still held at the valuation horizon becomes an
/// open trade, valued at the latest quote (or the most recent transaction
/// price when no quote is on file).
///
/// Portfolio transfers move shares without opening or closing a position and
/// are skipped entirely. A history in which a single transaction would carry
/// the position through zero, long directly into short or vice versa, is
/// rejected as inconsistent rather than silently split.
pub struct TradeCollector<'a> {
    converter: &'a dyn CurrencyConverterTrait,
    quotes: &'a dyn QuoteProviderTrait,
    report_currency: String,
    horizon: NaiveDate,
}

/// Mutable state of the trade currently being assembled.
struct OpenTrade {
    start: NaiveDate,
    is_long: bool,
    entry_shares: Decimal,
    entry_value: Decimal,
    exit_value: Decimal,
    transactions: Vec<TradeTransaction>,
}

impl<'a> TradeCollector<'a> {
    pub fn new(
        converter: &'a dyn CurrencyConverterTrait,
        quotes: &'a dyn QuoteProviderTrait,
        report_currency: impl Into<String>,
        horizon: NaiveDate,
    ) -> Self {
        TradeCollector {
            converter,
            quotes,
            report_currency: report_currency.into(),
            horizon,
        }
    }

    /// Collects all trades of one security up to the valuation horizon, in
    /// chronological order. At most the last trade is open.
    pub fn collect(&self, security: &Security, transactions: &[Transaction]) -> Result<Vec<Trade>> {
        let mut history: Vec<Transaction> = transactions
            .iter()
            .filter(|t| {
                t.security_id == security.id && t.date <= self.horizon && !t.tx_type.is_transfer()
            })
            .cloned()
            .collect();
        sort_chronologically(&mut history);

        debug!(
            "Collecting trades for security {} from {} transactions",
            security.id,
            history.len()
        );

        let mut trades = Vec::new();
        let mut net = Decimal::ZERO;
        let mut current: Option<OpenTrade> = None;
        let mut last_price_report: Option<Decimal> = None;

        for tx in &history {
            if tx.shares <= Decimal::ZERO {
                return Err(CalculatorError::InvalidTransaction(format!(
                    "transaction {} has non-positive share count {}",
                    tx.id, tx.shares
                ))
                .into());
            }

            let value = self.report_value(tx)?;
            if !tx.shares.is_zero() {
                last_price_report = Some(value / tx.shares);
            }

            let signed = if tx.tx_type.is_acquisition() {
                tx.shares
            } else {
                -tx.shares
            };
            let next_net = net + signed;

            if !net.is_zero() && !next_net.is_zero() && net.is_sign_positive() != next_net.is_sign_positive() {
                return Err(CalculatorError::InconsistentHistory(format!(
                    "transaction {} carries the position through zero ({} -> {})",
                    tx.id, net, next_net
                ))
                .into());
            }

            let trade = current.get_or_insert_with(|| OpenTrade {
                start: tx.date,
                is_long: tx.tx_type.is_acquisition(),
                entry_shares: Decimal::ZERO,
                entry_value: Decimal::ZERO,
                exit_value: Decimal::ZERO,
                transactions: Vec::new(),
            });

            if tx.tx_type.is_acquisition() == trade.is_long {
                trade.entry_shares += tx.shares;
                trade.entry_value += value;
            } else {
                trade.exit_value += value;
            }
            trade.transactions.push(TradeTransaction {
                transaction_id: tx.id.clone(),
                tx_type: tx.tx_type,
                date: tx.date,
                sequence: tx.sequence,
                shares: tx.shares,
                amount: Money::new(value, self.report_currency.clone()),
            });

            net = next_net;

            if net.is_zero() {
                if let Some(finished) = current.take() {
                    trades.push(self.closed_trade(security, finished, tx.date));
                }
            }
        }

        if let Some(open) = current.take() {
            trades.push(self.open_trade(security, open, net, last_price_report));
        }

        Ok(trades)
    }

    /// Collects trades for many securities into one chronologically mixed
    /// list, ordered by trade start.
    pub fn collect_all(
        &self,
        securities: &[Security],
        transactions: &[Transaction],
    ) -> Result<Vec<Trade>> {
        let mut all = Vec::new();
        for security in securities {
            all.extend(self.collect(security, transactions)?);
        }
        all.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(all)
    }

    fn closed_trade(&self, security: &Security, state: OpenTrade, end: NaiveDate) -> Trade {
        Trade {
            security_id: security.id.clone(),
            start: state.start,
            end: Some(end),
            valued_until: end,
            shares: state.entry_shares,
            is_long: state.is_long,
            entry_value: Money::new(state.entry_value, self.report_currency.clone()),
            exit_value: Money::new(state.exit_value, self.report_currency.clone()),
            transactions: state.transactions,
        }
    }

    /// Builds the open trade at the horizon: the residual shares are valued
    /// at the horizon price and booked on the exit side.
    fn open_trade(
        &self,
        security: &Security,
        state: OpenTrade,
        net: Decimal,
        last_price_report: Option<Decimal>,
    ) -> Trade {
        let residual = net.abs();
        let price = self
            .horizon_price(security)
            .or(last_price_report)
            .unwrap_or_else(|| {
                warn!(
                    "Open trade in {} has no valuation source at {}; valuing residual at zero",
                    security.id, self.horizon
                );
                Decimal::ZERO
            });
        let valuation = (residual * price).round_dp(ROUNDING_SCALE);

        Trade {
            security_id: security.id.clone(),
            start: state.start,
            end: None,
            valued_until: self.horizon,
            shares: state.entry_shares,
            is_long: state.is_long,
            entry_value: Money::new(state.entry_value, self.report_currency.clone()),
            exit_value: Money::new(state.exit_value + valuation, self.report_currency.clone()),
            transactions: state.transactions,
        }
    }

    /// Latest quote at the horizon in the report currency.
    fn horizon_price(&self, security: &Security) -> Option<Decimal> {
        let quote = self.quotes.latest_quote(&security.id, self.horizon)?;
        if security.currency == self.report_currency {
            return Some(quote);
        }
        match self
            .converter
            .rate(&security.currency, &self.report_currency, self.horizon)
        {
            Ok(rate) => Some(quote * rate),
            Err(_) => {
                warn!(
                    "No {}/{} rate at {}; falling back to transaction prices",
                    security.currency, self.report_currency, self.horizon
                );
                None
            }
        }
    }

    fn report_value(&self, tx: &Transaction) -> Result<Decimal> {
        if tx.amount.currency == self.report_currency {
            Ok(tx.amount.amount)
        } else {
            self.converter.convert(
                tx.amount.amount,
                &tx.amount.currency,
                &self.report_currency,
                tx.date,
            )
        }
    }
}
