use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::errors::{CurrencyError, Result};
use crate::fx::fx_traits::CurrencyConverterTrait;

/// An exchange-rate observation for one currency pair on one date.
#[derive(Debug, Clone)]
pub struct ExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub date: NaiveDate,
    pub rate: Decimal,
}

impl ExchangeRate {
    pub fn new(
        from_currency: impl Into<String>,
        to_currency: impl Into<String>,
        date: NaiveDate,
        rate: Decimal,
    ) -> Self {
        ExchangeRate {
            from_currency: from_currency.into(),
            to_currency: to_currency.into(),
            date,
            rate,
        }
    }
}

/// In-memory currency converter over independent per-pair time series.
///
/// Rates are stored in a `BTreeMap` per pair for O(log n) date lookup and
/// support exact as well as nearest-neighbor matches (past or future).
/// Inverse rates are derived automatically on insertion.
pub struct CurrencyConverter {
    /// Key: (from_currency, to_currency). Value: date-ordered rate series.
    rates: HashMap<(String, String), BTreeMap<NaiveDate, Decimal>>,
}

impl CurrencyConverter {
    pub fn new(exchange_rates: Vec<ExchangeRate>) -> Self {
        let mut converter = CurrencyConverter {
            rates: HashMap::new(),
        };
        converter.add_rates(exchange_rates);
        converter
    }

    /// Adds rate observations, deriving the inverse pair for each.
    pub fn add_rates(&mut self, rates: Vec<ExchangeRate>) {
        for rate in rates {
            if rate.from_currency == rate.to_currency {
                continue;
            }

            self.rates
                .entry((rate.from_currency.clone(), rate.to_currency.clone()))
                .or_default()
                .insert(rate.date, rate.rate);

            if !rate.rate.is_zero() {
                self.rates
                    .entry((rate.to_currency, rate.from_currency))
                    .or_default()
                    .insert(rate.date, Decimal::ONE / rate.rate);
            }
        }
    }

    /// Nearest-neighbor lookup: the closest observation on or before the date
    /// wins over a strictly later one at equal distance.
    fn nearest_rate(&self, from: &str, to: &str, date: NaiveDate) -> Option<Decimal> {
        let history = self.rates.get(&(from.to_string(), to.to_string()))?;

        let prev = history.range(..=date).next_back();
        let next = history.range(date..).next();

        match (prev, next) {
            (Some((d1, r1)), Some((d2, r2))) => {
                if d1 == d2 {
                    return Some(*r1);
                }
                let dist_prev = (date - *d1).num_days().abs();
                let dist_next = (*d2 - date).num_days().abs();
                if dist_prev <= dist_next {
                    Some(*r1)
                } else {
                    Some(*r2)
                }
            }
            (Some((_, r)), None) => Some(*r),
            (None, Some((_, r))) => Some(*r),
            (None, None) => None,
        }
    }
}

impl CurrencyConverterTrait for CurrencyConverter {
    fn rate(&self, from: &str, to: &str, date: NaiveDate) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.nearest_rate(from, to, date)
            .ok_or_else(|| {
                CurrencyError::MissingRate {
                    from: from.to_string(),
                    to: to.to_string(),
                    date,
                }
                .into()
            })
    }
}
