use log::{debug, warn};
use rust_decimal::Decimal;

use crate::errors::{CalculatorError, Result};
use crate::fx::CurrencyConverterTrait;
use crate::gains::gains_model::{
    CapitalGainsRecord, Convention, GainsKind, GainsSnapshot, SecurityGainsReport, Trail,
    TrailEntry,
};
use crate::gains::lot_ledger::{
    FifoLedger, GainsAccumulator, MovingAverageLedger, RawTrailEntry, ReplayEvent,
};
use crate::money::{round_amount, Money};
use crate::securities::Security;
use crate::transactions::{sort_chronologically, QuoteProviderTrait, Transaction, TransactionType};
use crate::utils::Interval;

/// Replays transaction histories and produces capital gains records under
/// both cost-basis conventions in a single chronological pass.
pub struct CapitalGainsCalculator<'a> {
    converter: &'a dyn CurrencyConverterTrait,
    quotes: &'a dyn QuoteProviderTrait,
    report_currency: String,
}

impl<'a> CapitalGainsCalculator<'a> {
    pub fn new(
        converter: &'a dyn CurrencyConverterTrait,
        quotes: &'a dyn QuoteProviderTrait,
        report_currency: impl Into<String>,
    ) -> Self {
        CapitalGainsCalculator {
            converter,
            quotes,
            report_currency: report_currency.into(),
        }
    }

    /// Computes all four records for one security over the interval.
    ///
    /// The ledger replays every transaction up to the interval end; realized
    /// gains accumulate only for disposals falling inside the interval. A
    /// security with no disposals yields zero-valued realized records.
    pub fn calculate(
        &self,
        security: &Security,
        transactions: &[Transaction],
        interval: Interval,
    ) -> Result<SecurityGainsReport> {
        debug!(
            "Calculating capital gains for security {} over {} to {}",
            security.id, interval.start, interval.end
        );

        let mut history: Vec<Transaction> = transactions
            .iter()
            .filter(|t| t.security_id == security.id && t.date <= interval.end)
            .cloned()
            .collect();
        sort_chronologically(&mut history);

        let mut fifo = FifoLedger::default();
        let mut moving_avg = MovingAverageLedger::default();
        let mut last_price_report: Option<Decimal> = None;

        for tx in &history {
            let event = self.normalize(security, tx, interval)?;

            if let Some(price) = per_share(event.value, event.shares) {
                last_price_report = Some(price);
            }

            match event.tx_type {
                TransactionType::TransferOut => {
                    fifo.transfer_out(&event)?;
                    moving_avg.transfer_out(&event)?;
                }
                TransactionType::TransferIn => {
                    fifo.transfer_in(&event);
                    moving_avg.transfer_in(&event);
                }
                t if t.is_acquisition() => {
                    fifo.acquire(&event);
                    moving_avg.acquire(&event);
                }
                _ => {
                    fifo.dispose(&event);
                    moving_avg.dispose(&event);
                }
            }
        }

        let valuation = self.end_valuation(security, interval, last_price_report);

        let unrealized_fifo = self.unrealized_fifo(&fifo, &valuation, interval);
        let unrealized_moving_avg = self.unrealized_moving_avg(&moving_avg, &valuation, interval);

        Ok(SecurityGainsReport {
            security_id: security.id.clone(),
            currency: self.report_currency.clone(),
            realized_fifo: self.build_record(&fifo.realized),
            realized_moving_avg: self.build_record(&moving_avg.realized),
            unrealized_fifo,
            unrealized_moving_avg,
        })
    }

    /// Computes the single record for one convention and kind.
    pub fn compute_gains(
        &self,
        security: &Security,
        transactions: &[Transaction],
        interval: Interval,
        convention: Convention,
        kind: GainsKind,
    ) -> Result<CapitalGainsRecord> {
        let report = self.calculate(security, transactions, interval)?;
        Ok(report.record(convention, kind).clone())
    }

    /// Batch entry point. Securities absent from the snapshot stay absent;
    /// "no data" and "zero gains" are distinct answers.
    pub fn calculate_all(
        &self,
        securities: &[Security],
        transactions: &[Transaction],
        interval: Interval,
    ) -> Result<GainsSnapshot> {
        let mut snapshot = GainsSnapshot::default();
        for security in securities {
            snapshot.insert(self.calculate(security, transactions, interval)?);
        }
        Ok(snapshot)
    }

    /// Normalizes a transaction into report-currency values plus the foreign
    /// leg used for the security/forex gain split.
    fn normalize(
        &self,
        security: &Security,
        tx: &Transaction,
        interval: Interval,
    ) -> Result<ReplayEvent> {
        if tx.shares <= Decimal::ZERO {
            return Err(CalculatorError::InvalidTransaction(format!(
                "transaction {} has non-positive share count {}",
                tx.id, tx.shares
            ))
            .into());
        }

        let value = if tx.amount.currency == self.report_currency {
            tx.amount.amount
        } else {
            self.converter.convert(
                tx.amount.amount,
                &tx.amount.currency,
                &self.report_currency,
                tx.date,
            )?
        };

        let (foreign_value, rate) = if security.currency == self.report_currency {
            (None, None)
        } else if let Some(forex) = &tx.forex {
            (Some(forex.gross_foreign.amount), Some(forex.exchange_rate))
        } else {
            match self.converter.rate(&security.currency, &self.report_currency, tx.date) {
                Ok(rate) if !rate.is_zero() => (Some(value / rate), Some(rate)),
                Ok(_) | Err(_) => {
                    warn!(
                        "No {}/{} rate for transaction {} on {}; forex split unavailable",
                        security.currency, self.report_currency, tx.id, tx.date
                    );
                    (None, None)
                }
            }
        };

        Ok(ReplayEvent {
            tx_id: tx.id.clone(),
            date: tx.date,
            tx_type: tx.tx_type,
            shares: tx.shares,
            value,
            foreign_value,
            rate,
            in_interval: interval.contains(tx.date),
        })
    }

    /// Resolves the per-share valuation and exchange rate at the interval
    /// end. Falls back to the most recent transaction value when no quote is
    /// on file, or when a foreign quote cannot be converted.
    fn end_valuation(
        &self,
        security: &Security,
        interval: Interval,
        last_price_report: Option<Decimal>,
    ) -> EndValuation {
        let foreign = security.currency != self.report_currency;
        let end_rate = if !foreign {
            None
        } else {
            match self
                .converter
                .rate(&security.currency, &self.report_currency, interval.end)
            {
                Ok(rate) => Some(rate),
                Err(err) => {
                    warn!(
                        "No {}/{} rate as of {} ({err}); valuing at last transaction price",
                        security.currency, self.report_currency, interval.end
                    );
                    None
                }
            }
        };

        let price_report = match self.quotes.latest_quote(&security.id, interval.end) {
            Some(quote) if !foreign => Some(quote),
            Some(quote) => match end_rate {
                Some(rate) => Some(quote * rate),
                // The quote is in the security currency and cannot be
                // converted without a rate.
                None => last_price_report,
            },
            None => {
                if last_price_report.is_some() {
                    debug!(
                        "No quote for {} as of {}; valuing at last transaction price",
                        security.id, interval.end
                    );
                }
                last_price_report
            }
        };

        EndValuation {
            price_report,
            end_rate,
        }
    }

    /// Marks the remaining FIFO lots to the interval-end valuation: the
    /// identical disposal formula with the interval end as a synthetic
    /// disposal date.
    fn unrealized_fifo(
        &self,
        ledger: &FifoLedger,
        valuation: &EndValuation,
        interval: Interval,
    ) -> CapitalGainsRecord {
        let mut accumulator = GainsAccumulator::default();
        let valuation_id = format!("valuation:{}", interval.end);

        if let Some(price) = valuation.price_report {
            for lot in ledger.remaining_long() {
                let value_end = (lot.shares * price).round_dp(crate::constants::ROUNDING_SCALE);
                let gain = value_end - lot.cost;
                let forex = lot
                    .foreign_cost
                    .zip(valuation.end_rate)
                    .map(|(foreign, rate)| round_amount(foreign * rate) - round_amount(lot.cost));
                accumulator.record(&valuation_id, &lot.source, lot.shares, gain, forex);
            }
            for lot in ledger.remaining_short() {
                let value_end = (lot.shares * price).round_dp(crate::constants::ROUNDING_SCALE);
                let gain = lot.cost - value_end;
                let forex = lot
                    .foreign_cost
                    .zip(valuation.end_rate)
                    .map(|(foreign, rate)| round_amount(lot.cost) - round_amount(foreign * rate));
                accumulator.record(&valuation_id, &lot.source, lot.shares, gain, forex);
            }
        } else if ledger.remaining_long().next().is_some() || ledger.remaining_short().next().is_some()
        {
            warn!("Open position without any valuation source; unrealized gains reported as zero");
        }

        self.build_record(&accumulator)
    }

    fn unrealized_moving_avg(
        &self,
        ledger: &MovingAverageLedger,
        valuation: &EndValuation,
        interval: Interval,
    ) -> CapitalGainsRecord {
        let mut accumulator = GainsAccumulator::default();
        let valuation_id = format!("valuation:{}", interval.end);

        if let Some(price) = valuation.price_report {
            if ledger.shares > Decimal::ZERO {
                let value_end =
                    (ledger.shares * price).round_dp(crate::constants::ROUNDING_SCALE);
                let gain = value_end - ledger.cost;
                let forex = ledger
                    .foreign
                    .zip(valuation.end_rate)
                    .map(|(foreign, rate)| {
                        round_amount(foreign * rate) - round_amount(ledger.cost)
                    });
                accumulator.record(&valuation_id, &valuation_id, ledger.shares, gain, forex);
            } else if ledger.shares < Decimal::ZERO {
                let quantity = -ledger.shares;
                let value_end = (quantity * price).round_dp(crate::constants::ROUNDING_SCALE);
                let gain = ledger.cost - value_end;
                let forex = ledger
                    .foreign
                    .zip(valuation.end_rate)
                    .map(|(foreign, rate)| {
                        round_amount(ledger.cost) - round_amount(foreign * rate)
                    });
                accumulator.record(&valuation_id, &valuation_id, quantity, gain, forex);
            }
        }

        self.build_record(&accumulator)
    }

    fn build_record(&self, accumulator: &GainsAccumulator) -> CapitalGainsRecord {
        CapitalGainsRecord {
            capital_gains: Money::new(round_amount(accumulator.gains), &self.report_currency),
            forex_capital_gains: Money::new(round_amount(accumulator.forex), &self.report_currency),
            trail: self.build_trail(&accumulator.trail),
            forex_trail: self.build_trail(&accumulator.forex_trail),
        }
    }

    fn build_trail(&self, raw: &[RawTrailEntry]) -> Trail {
        let mut trail = Trail::default();
        for entry in raw {
            trail.push(TrailEntry {
                transaction_id: entry.transaction_id.clone(),
                source_transaction_id: entry.source_transaction_id.clone(),
                shares: entry.shares,
                value: Money::new(entry.value, &self.report_currency),
            });
        }
        trail
    }
}

struct EndValuation {
    /// Per-share value at the interval end in the report currency.
    price_report: Option<Decimal>,
    /// Foreign -> report rate at the interval end, for foreign securities.
    end_rate: Option<Decimal>,
}

fn per_share(value: Decimal, shares: Decimal) -> Option<Decimal> {
    if shares.is_zero() {
        None
    } else {
        Some(value / shares)
    }
}
