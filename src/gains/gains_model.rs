use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::money::{round_amount, Money};

/// Cost-basis convention for consuming acquisitions on disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Convention {
    Fifo,
    MovingAverage,
}

/// Whether a record covers gains realized by disposals inside the interval
/// or the mark-to-quote gain on the position still open at the interval end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GainsKind {
    Realized,
    Unrealized,
}

/// One lot slice's signed contribution to a gains record.
///
/// `transaction_id` is the event the gain was recognized on (the disposal,
/// or the synthetic valuation at the interval end); `source_transaction_id`
/// is the acquisition that created the consumed lot slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailEntry {
    pub transaction_id: String,
    pub source_transaction_id: String,
    pub shares: Decimal,
    pub value: Money,
}

/// Attribution trail: the per-slice decomposition of a gains record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trail(Vec<TrailEntry>);

impl Trail {
    pub fn push(&mut self, entry: TrailEntry) {
        self.0.push(entry);
    }

    pub fn entries(&self) -> &[TrailEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all contributions, rounded to the monetary precision.
    pub fn value(&self, currency: &str) -> Money {
        let total: Decimal = self.0.iter().map(|e| e.value.amount).sum();
        Money::new(round_amount(total), currency)
    }
}

/// Capital gains for one (security, convention, realized|unrealized)
/// combination. `capital_gains` is the total gain; `forex_capital_gains` is
/// the component of that total attributable to currency movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalGainsRecord {
    pub capital_gains: Money,
    pub forex_capital_gains: Money,
    pub trail: Trail,
    pub forex_trail: Trail,
}

impl CapitalGainsRecord {
    pub fn zero(currency: &str) -> Self {
        CapitalGainsRecord {
            capital_gains: Money::zero(currency),
            forex_capital_gains: Money::zero(currency),
            trail: Trail::default(),
            forex_trail: Trail::default(),
        }
    }
}

/// The four records produced by one replay of a security's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGainsReport {
    pub security_id: String,
    pub currency: String,
    pub realized_fifo: CapitalGainsRecord,
    pub realized_moving_avg: CapitalGainsRecord,
    pub unrealized_fifo: CapitalGainsRecord,
    pub unrealized_moving_avg: CapitalGainsRecord,
}

impl SecurityGainsReport {
    pub fn record(&self, convention: Convention, kind: GainsKind) -> &CapitalGainsRecord {
        match (convention, kind) {
            (Convention::Fifo, GainsKind::Realized) => &self.realized_fifo,
            (Convention::Fifo, GainsKind::Unrealized) => &self.unrealized_fifo,
            (Convention::MovingAverage, GainsKind::Realized) => &self.realized_moving_avg,
            (Convention::MovingAverage, GainsKind::Unrealized) => &self.unrealized_moving_avg,
        }
    }
}

/// Reports for a batch of securities over one interval. An unknown security
/// yields `None`, which is distinct from a zero-valued report.
#[derive(Debug, Clone, Default)]
pub struct GainsSnapshot {
    reports: HashMap<String, SecurityGainsReport>,
}

impl GainsSnapshot {
    pub fn insert(&mut self, report: SecurityGainsReport) {
        self.reports.insert(report.security_id.clone(), report);
    }

    pub fn get_report(&self, security_id: &str) -> Option<&SecurityGainsReport> {
        self.reports.get(security_id)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
