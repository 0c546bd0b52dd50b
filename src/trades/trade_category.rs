use std::cell::RefCell;
use std::collections::HashSet;

use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::errors::{CurrencyError, Result, ValidationError};
use crate::math::irr;
use crate::money::Money;
use crate::taxonomies::{Classification, TaxonomyProviderTrait};
use crate::trades::trades_model::Trade;

/// A trade's attribution to one category. Weights express partial
/// classification, not partial existence: distinct-trade counts ignore them.
#[derive(Debug, Clone)]
struct WeightedTrade {
    trade: Trade,
    weight: Decimal,
}

/// One dated cash flow of the category-wide IRR reconstruction. `order` is
/// the insertion sequence used as a stable same-day tie-break.
struct WeightedCashFlow {
    date: NaiveDate,
    amount: f64,
    order: usize,
}

/// Aggregate statistics of a category, computed in one pass and cached until
/// the next mutation.
#[derive(Debug, Clone)]
struct Aggregates {
    trade_count: usize,
    winning_trades_count: usize,
    losing_trades_count: usize,
    total_profit_loss: Money,
    total_entry_value: Money,
    total_exit_value: Money,
    average_return: Decimal,
    average_irr: f64,
    average_holding_period: i64,
    win_rate: Decimal,
}

/// Groups trades under a classification with fractional weights and computes
/// weighted aggregate statistics lazily.
///
/// Aggregates are recomputed once per mutation epoch: `add_trade` clears the
/// cache, the first accessor afterwards rebuilds it. The cache is not meant
/// for concurrent mutation; populate the category fully before sharing it.
#[derive(Debug)]
pub struct TradeCategory {
    classification: Classification,
    currency: String,
    weighted_trades: Vec<WeightedTrade>,
    cache: RefCell<Option<Aggregates>>,
}

impl TradeCategory {
    pub fn new(classification: Classification, currency: impl Into<String>) -> Self {
        TradeCategory {
            classification,
            currency: currency.into(),
            weighted_trades: Vec::new(),
            cache: RefCell::new(None),
        }
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Adds a trade with its attribution weight and invalidates the cached
    /// aggregates. The trade must already be valued in the category currency.
    pub fn add_trade(&mut self, trade: Trade, weight: Decimal) -> Result<()> {
        if weight < Decimal::ZERO || weight > Decimal::ONE {
            return Err(ValidationError::InvalidInput(format!(
                "weight {weight} outside [0, 1]"
            ))
            .into());
        }
        if trade.entry_value.currency != self.currency {
            return Err(CurrencyError::Mismatch {
                expected: self.currency.clone(),
                actual: trade.entry_value.currency.clone(),
            }
            .into());
        }
        self.weighted_trades.push(WeightedTrade { trade, weight });
        self.cache.replace(None);
        Ok(())
    }

    /// Distinct trades of the category, in insertion order.
    pub fn trades(&self) -> Vec<&Trade> {
        let mut seen = HashSet::new();
        self.weighted_trades
            .iter()
            .map(|wt| &wt.trade)
            .filter(|t| seen.insert(t.key().to_string()))
            .collect()
    }

    pub fn trade_count(&self) -> usize {
        self.aggregate(|a| a.trade_count)
    }

    pub fn winning_trades_count(&self) -> usize {
        self.aggregate(|a| a.winning_trades_count)
    }

    pub fn losing_trades_count(&self) -> usize {
        self.aggregate(|a| a.losing_trades_count)
    }

    pub fn total_weight(&self) -> Decimal {
        self.weighted_trades.iter().map(|wt| wt.weight).sum()
    }

    pub fn total_profit_loss(&self) -> Money {
        self.aggregate(|a| a.total_profit_loss.clone())
    }

    pub fn total_entry_value(&self) -> Money {
        self.aggregate(|a| a.total_entry_value.clone())
    }

    pub fn total_exit_value(&self) -> Money {
        self.aggregate(|a| a.total_exit_value.clone())
    }

    /// Weighted aggregate return: total profit/loss over total entry value.
    /// This differs from the weighted average of per-trade returns when the
    /// trades have different sizes.
    pub fn average_return(&self) -> Decimal {
        self.aggregate(|a| a.average_return)
    }

    /// Category-wide money-weighted return from the combined cash flows of
    /// all weighted trades.
    pub fn average_irr(&self) -> f64 {
        self.aggregate(|a| a.average_irr)
    }

    /// Weighted mean holding period in days, rounded to the nearest day.
    pub fn average_holding_period(&self) -> i64 {
        self.aggregate(|a| a.average_holding_period)
    }

    /// Share of total weight carried by non-losing trades.
    pub fn win_rate(&self) -> Decimal {
        self.aggregate(|a| a.win_rate)
    }

    fn aggregate<T>(&self, select: impl FnOnce(&Aggregates) -> T) -> T {
        let mut cache = self.cache.borrow_mut();
        let aggregates = cache.get_or_insert_with(|| self.compute());
        select(aggregates)
    }

    fn compute(&self) -> Aggregates {
        let total_weight = self.total_weight();

        let mut distinct = HashSet::new();
        let mut winning = HashSet::new();
        let mut losing = HashSet::new();
        for wt in &self.weighted_trades {
            let key = wt.trade.key().to_string();
            if wt.trade.is_loss() {
                losing.insert(key.clone());
            } else {
                winning.insert(key.clone());
            }
            distinct.insert(key);
        }

        if total_weight.is_zero() {
            return Aggregates {
                trade_count: distinct.len(),
                winning_trades_count: winning.len(),
                losing_trades_count: losing.len(),
                total_profit_loss: Money::zero(self.currency.clone()),
                total_entry_value: Money::zero(self.currency.clone()),
                total_exit_value: Money::zero(self.currency.clone()),
                average_return: Decimal::ZERO,
                average_irr: 0.0,
                average_holding_period: 0,
                win_rate: Decimal::ZERO,
            };
        }

        let mut total_profit_loss = Money::zero(self.currency.clone());
        let mut total_entry_value = Money::zero(self.currency.clone());
        let mut total_exit_value = Money::zero(self.currency.clone());
        let mut weighted_days = 0.0f64;
        let mut winning_weight = Decimal::ZERO;

        for wt in &self.weighted_trades {
            let pnl = wt.trade.profit_loss().multiply_and_round(wt.weight);
            let entry = wt.trade.entry_value.multiply_and_round(wt.weight);
            let exit = wt.trade.exit_value.multiply_and_round(wt.weight);
            // Same-currency additions by construction, see add_trade.
            total_profit_loss.amount += pnl.amount;
            total_entry_value.amount += entry.amount;
            total_exit_value.amount += exit.amount;

            weighted_days += wt.trade.holding_period_days() as f64
                * wt.weight.to_f64().unwrap_or(0.0);
            if !wt.trade.is_loss() {
                winning_weight += wt.weight;
            }
        }

        let average_return = if total_entry_value.amount.is_zero() {
            Decimal::ZERO
        } else {
            total_profit_loss.amount / total_entry_value.amount
        };

        let average_holding_period =
            (weighted_days / total_weight.to_f64().unwrap_or(1.0)).round() as i64;

        Aggregates {
            trade_count: distinct.len(),
            winning_trades_count: winning.len(),
            losing_trades_count: losing.len(),
            total_profit_loss,
            total_entry_value,
            total_exit_value,
            average_return,
            average_irr: self.category_irr(),
            average_holding_period,
            win_rate: winning_weight / total_weight,
        }
    }

    /// Category-level IRR from the combined cash flows of all weighted
    /// trades, rather than an average of per-trade IRRs.
    ///
    /// Short trades carry a running collateral: opening proceeds are held
    /// back as negative flows, a reducing transaction returns the collateral
    /// net of the buy-back cost, and the remaining collateral flows back at
    /// the trade end. A degenerate cash-flow set yields 0.
    fn category_irr(&self) -> f64 {
        let mut cashflows: Vec<WeightedCashFlow> = Vec::new();
        let mut sequence = 0usize;

        for wt in &self.weighted_trades {
            let weight = wt.weight.to_f64().unwrap_or(0.0);
            let is_long = wt.trade.is_long;
            let mut collateral = 0.0f64;

            for tx in &wt.trade.transactions {
                let mut amount = tx.amount.amount.to_f64().unwrap_or(0.0) * weight;

                if tx.tx_type.is_acquisition() == is_long {
                    collateral += amount;
                    amount = -amount;
                } else if !is_long {
                    amount = collateral - amount;
                }

                cashflows.push(WeightedCashFlow {
                    date: tx.date,
                    amount,
                    order: sequence,
                });
                sequence += 1;
            }

            if !wt.trade.is_closed() {
                let mut amount = wt.trade.exit_value.amount.to_f64().unwrap_or(0.0) * weight;
                if !is_long {
                    amount = collateral - amount;
                }
                cashflows.push(WeightedCashFlow {
                    date: wt.trade.valued_until,
                    amount,
                    order: sequence,
                });
                sequence += 1;
            }

            if !is_long {
                cashflows.push(WeightedCashFlow {
                    date: wt.trade.valued_until,
                    amount: collateral,
                    order: sequence,
                });
                sequence += 1;
            }
        }

        if cashflows.is_empty() {
            return 0.0;
        }

        cashflows.sort_by(|a, b| a.date.cmp(&b.date).then(a.order.cmp(&b.order)));

        let dates: Vec<NaiveDate> = cashflows.iter().map(|cf| cf.date).collect();
        let values: Vec<f64> = cashflows.iter().map(|cf| cf.amount).collect();

        let rate = irr::calculate(&dates, &values);
        if rate.is_finite() {
            rate
        } else {
            0.0
        }
    }
}

/// Groups trades into categories according to the taxonomy's classification
/// weights. Categories appear in order of first use; unclassified trades are
/// not represented.
pub fn group_trades(
    trades: &[Trade],
    taxonomy: &dyn TaxonomyProviderTrait,
    currency: &str,
) -> Result<Vec<TradeCategory>> {
    let mut categories: Vec<TradeCategory> = Vec::new();

    for trade in trades {
        for (classification, weight) in taxonomy.classifications_for(&trade.security_id) {
            let position = categories
                .iter()
                .position(|c| c.classification().id == classification.id);
            let category = match position {
                Some(index) => &mut categories[index],
                None => {
                    categories.push(TradeCategory::new(classification, currency));
                    let last = categories.len() - 1;
                    &mut categories[last]
                }
            };
            category.add_trade(trade.clone(), weight)?;
        }
    }

    Ok(categories)
}
