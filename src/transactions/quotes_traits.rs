use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Contract for the market-price capability used to value open positions.
pub trait QuoteProviderTrait: Send + Sync {
    /// Latest known price for the security on or before `date`, in the
    /// security's quote currency. `None` when no price is on file; the
    /// engines then fall back to the most recent transaction value.
    fn latest_quote(&self, security_id: &str, date: NaiveDate) -> Option<Decimal>;
}

/// Quote provider without any prices. Forces the transaction-value fallback.
pub struct NoQuotes;

impl QuoteProviderTrait for NoQuotes {
    fn latest_quote(&self, _security_id: &str, _date: NaiveDate) -> Option<Decimal> {
        None
    }
}
