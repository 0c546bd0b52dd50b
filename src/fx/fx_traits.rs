use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::Result;

/// Contract for the currency-conversion capability consumed by the engines.
///
/// Implementations must be pure lookups over immutable data so that
/// calculations for different securities can run in parallel without
/// coordination.
pub trait CurrencyConverterTrait: Send + Sync {
    /// Exchange rate from `from` to `to` on (or nearest to) `date`.
    /// Same-currency requests return 1 and never fail.
    fn rate(&self, from: &str, to: &str, date: NaiveDate) -> Result<Decimal>;

    /// Converts `amount` from `from` to `to` using the rate on `date`.
    fn convert(&self, amount: Decimal, from: &str, to: &str, date: NaiveDate) -> Result<Decimal> {
        Ok(amount * self.rate(from, to, date)?)
    }
}
