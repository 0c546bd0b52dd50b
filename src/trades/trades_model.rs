use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::transactions::TransactionType;

/// A transaction as it participates in a trade: the original identity plus
/// its value converted to the report currency at the transaction date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeTransaction {
    pub transaction_id: String,
    pub tx_type: TransactionType,
    pub date: NaiveDate,
    pub sequence: i64,
    pub shares: Decimal,
    /// Report-currency value of the transaction.
    pub amount: Money,
}

/// One round trip in a security: the span from a position opening out of a
/// flat state until it returns to flat (closed), or until the valuation
/// horizon (open).
///
/// All monetary fields are in the report currency. `entry_value` is the sum
/// of transactions in the trade's direction, `exit_value` the sum of
/// transactions against it; for an open trade the exit side is the market
/// valuation of the remaining shares at the horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub security_id: String,
    pub start: NaiveDate,
    /// Date the position returned to flat. `None` while the trade is open.
    pub end: Option<NaiveDate>,
    /// Date up to which the trade is valued: `end` for closed trades, the
    /// valuation horizon for open ones.
    pub valued_until: NaiveDate,
    /// Total shares entered over the lifetime of the trade.
    pub shares: Decimal,
    pub is_long: bool,
    pub entry_value: Money,
    pub exit_value: Money,
    pub transactions: Vec<TradeTransaction>,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.end.is_some()
    }

    /// Stable identity of the trade, used when counting distinct trades
    /// across categories. A transaction belongs to exactly one trade, so the
    /// opening transaction id is unique per trade.
    pub fn key(&self) -> &str {
        self.transactions
            .first()
            .map(|t| t.transaction_id.as_str())
            .unwrap_or("")
    }

    /// Profit or loss of the trade in the report currency.
    ///
    /// For a long trade this is exit minus entry; for a short trade entry
    /// (the opening proceeds) minus exit (the cover cost), so that a
    /// profitable short is positive.
    pub fn profit_loss(&self) -> Money {
        let amount = if self.is_long {
            self.exit_value.amount - self.entry_value.amount
        } else {
            self.entry_value.amount - self.exit_value.amount
        };
        Money::new(amount, self.entry_value.currency.clone())
    }

    /// Profit or loss relative to the capital committed at entry.
    /// Zero-entry trades report a zero return.
    pub fn return_rate(&self) -> Decimal {
        let entry = self.entry_value.amount.abs();
        if entry.is_zero() {
            Decimal::ZERO
        } else {
            self.profit_loss().amount / entry
        }
    }

    /// Calendar days the position was (or has been) held.
    pub fn holding_period_days(&self) -> i64 {
        (self.valued_until - self.start).num_days()
    }

    pub fn is_loss(&self) -> bool {
        self.profit_loss().amount.is_sign_negative() && !self.profit_loss().is_zero()
    }
}
