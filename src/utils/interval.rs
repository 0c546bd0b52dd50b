use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A report interval, half-open: `(start, end]`.
///
/// Transactions on the start date belong to the previous interval; the end
/// date is the valuation date for unrealized gains and open trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Interval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Interval { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date > self.start && date <= self.end
    }
}
