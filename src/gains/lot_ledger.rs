use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use std::collections::VecDeque;

use crate::constants::ROUNDING_SCALE;
use crate::errors::{CalculatorError, Result};
use crate::money::round_amount;
use crate::transactions::TransactionType;

/// A transaction normalized for replay: amounts expressed in the report
/// currency, the foreign gross value when the security is quoted in another
/// currency, and the exchange rate effective on the transaction date.
#[derive(Debug, Clone)]
pub(crate) struct ReplayEvent {
    pub tx_id: String,
    pub date: NaiveDate,
    pub tx_type: TransactionType,
    /// Unsigned share count; the type determines the direction.
    pub shares: Decimal,
    /// Gross value in the report currency.
    pub value: Decimal,
    /// Gross value in the security's quote currency, when foreign.
    pub foreign_value: Option<Decimal>,
    /// Foreign -> report rate effective for this event (recorded on the
    /// transaction, or looked up at its date). `None` for same-currency.
    pub rate: Option<Decimal>,
    /// Whether a gain realized by this event falls into the report interval.
    pub in_interval: bool,
}

impl ReplayEvent {
    fn value_fraction(&self, shares: Decimal) -> Decimal {
        (self.value * shares / self.shares).round_dp(ROUNDING_SCALE)
    }

    fn foreign_fraction(&self, shares: Decimal) -> Option<Decimal> {
        self.foreign_value
            .map(|f| (f * shares / self.shares).round_dp(ROUNDING_SCALE))
    }
}

/// Signed gains accumulated during a replay, with the per-slice trail.
#[derive(Debug, Default, Clone)]
pub(crate) struct GainsAccumulator {
    pub gains: Decimal,
    pub forex: Decimal,
    pub trail: Vec<RawTrailEntry>,
    pub forex_trail: Vec<RawTrailEntry>,
    pub disposed_shares: Decimal,
}

#[derive(Debug, Clone)]
pub(crate) struct RawTrailEntry {
    pub transaction_id: String,
    pub source_transaction_id: String,
    pub shares: Decimal,
    pub value: Decimal,
}

impl GainsAccumulator {
    pub(crate) fn record(
        &mut self,
        tx_id: &str,
        source_id: &str,
        shares: Decimal,
        gain: Decimal,
        forex: Option<Decimal>,
    ) {
        self.gains += gain;
        self.disposed_shares += shares;
        self.trail.push(RawTrailEntry {
            transaction_id: tx_id.to_string(),
            source_transaction_id: source_id.to_string(),
            shares,
            value: gain,
        });
        if let Some(fx) = forex {
            self.forex += fx;
            self.forex_trail.push(RawTrailEntry {
                transaction_id: tx_id.to_string(),
                source_transaction_id: source_id.to_string(),
                shares,
                value: fx,
            });
        }
    }
}

/// A slice of acquired shares with its own acquisition date and cost basis.
/// On the short queue, `cost` and `foreign_cost` hold the sale proceeds.
#[derive(Debug, Clone)]
pub(crate) struct Lot {
    pub acquisition_date: NaiveDate,
    pub shares: Decimal,
    pub cost: Decimal,
    pub foreign_cost: Option<Decimal>,
    pub source: String,
}

impl Lot {
    fn split_off(&mut self, shares: Decimal) -> Lot {
        let cost_fraction = (self.cost * shares / self.shares).round_dp(ROUNDING_SCALE);
        let foreign_fraction = self
            .foreign_cost
            .map(|f| (f * shares / self.shares).round_dp(ROUNDING_SCALE));

        self.cost -= cost_fraction;
        self.foreign_cost = self.foreign_cost.zip(foreign_fraction).map(|(f, c)| f - c);
        self.shares -= shares;

        Lot {
            acquisition_date: self.acquisition_date,
            shares,
            cost: cost_fraction,
            foreign_cost: foreign_fraction,
            source: self.source.clone(),
        }
    }
}

/// FIFO bookkeeping: ordered long lots, ordered short lots, and lot
/// fractions parked between the two legs of a portfolio transfer.
#[derive(Debug, Default)]
pub(crate) struct FifoLedger {
    long: VecDeque<Lot>,
    short: VecDeque<Lot>,
    parked: VecDeque<Lot>,
    pub realized: GainsAccumulator,
}

impl FifoLedger {
    /// Buy or inbound delivery: covers open short lots oldest-first, any
    /// residual opens a new long lot.
    pub fn acquire(&mut self, ev: &ReplayEvent) {
        let mut remaining = ev.shares;

        while remaining > Decimal::ZERO {
            let Some(front) = self.short.front_mut() else {
                break;
            };
            let take = front.shares.min(remaining);
            let consumed = front.split_off(take);
            if front.shares.is_zero() {
                self.short.pop_front();
            }

            // Covering below the original sale price realizes a gain.
            let cost_fraction = ev.value_fraction(take);
            let gain = consumed.cost - cost_fraction;
            let forex = match (consumed.foreign_cost, ev.rate) {
                (Some(foreign_proceeds), Some(rate)) => {
                    Some(round_amount(consumed.cost) - round_amount(foreign_proceeds * rate))
                }
                _ => None,
            };
            if ev.in_interval {
                self.realized
                    .record(&ev.tx_id, &consumed.source, take, gain, forex);
            }
            remaining -= take;
        }

        if remaining > Decimal::ZERO {
            self.long.push_back(Lot {
                acquisition_date: ev.date,
                shares: remaining,
                cost: ev.value_fraction(remaining),
                foreign_cost: ev.foreign_fraction(remaining),
                source: ev.tx_id.clone(),
            });
        }
    }

    /// Sell or outbound delivery: consumes long lots oldest-first, any
    /// residual opens a short lot holding the sale proceeds.
    pub fn dispose(&mut self, ev: &ReplayEvent) {
        let mut remaining = ev.shares;

        while remaining > Decimal::ZERO {
            let Some(front) = self.long.front_mut() else {
                break;
            };
            let take = front.shares.min(remaining);
            let consumed = front.split_off(take);
            if front.shares.is_zero() {
                self.long.pop_front();
            }

            let proceeds_fraction = ev.value_fraction(take);
            let gain = proceeds_fraction - consumed.cost;
            let forex = match (consumed.foreign_cost, ev.rate) {
                (Some(foreign_cost), Some(rate)) => {
                    Some(round_amount(foreign_cost * rate) - round_amount(consumed.cost))
                }
                _ => None,
            };
            if ev.in_interval {
                self.realized
                    .record(&ev.tx_id, &consumed.source, take, gain, forex);
            }
            remaining -= take;
        }

        if remaining > Decimal::ZERO {
            self.short.push_back(Lot {
                acquisition_date: ev.date,
                shares: remaining,
                cost: ev.value_fraction(remaining),
                foreign_cost: ev.foreign_fraction(remaining),
                source: ev.tx_id.clone(),
            });
        }
    }

    /// Transfer-out: a disposal at zero realized gain. The consumed lot
    /// fractions keep their acquisition dates and cost bases and wait for
    /// the matching transfer-in.
    pub fn transfer_out(&mut self, ev: &ReplayEvent) -> Result<()> {
        let mut remaining = ev.shares;

        while remaining > Decimal::ZERO {
            let Some(front) = self.long.front_mut() else {
                return Err(CalculatorError::InconsistentHistory(format!(
                    "transfer of {} shares exceeds held position (transaction {})",
                    ev.shares, ev.tx_id
                ))
                .into());
            };
            let take = front.shares.min(remaining);
            let parked = front.split_off(take);
            if front.shares.is_zero() {
                self.long.pop_front();
            }
            self.parked.push_back(parked);
            remaining -= take;
        }
        Ok(())
    }

    /// Transfer-in: re-inserts parked fractions basis-intact. Without a
    /// preceding transfer-out in scope, the shares arrive as a plain
    /// acquisition at the transaction amount.
    pub fn transfer_in(&mut self, ev: &ReplayEvent) {
        if self.parked.is_empty() {
            warn!(
                "transfer-in {} without matching transfer-out; treating as acquisition",
                ev.tx_id
            );
            self.acquire(ev);
            return;
        }

        let mut remaining = ev.shares;
        while remaining > Decimal::ZERO {
            let Some(front) = self.parked.front_mut() else {
                break;
            };
            let take = front.shares.min(remaining);
            let lot = front.split_off(take);
            if front.shares.is_zero() {
                self.parked.pop_front();
            }
            self.long.push_back(lot);
            remaining -= take;
        }

        // Restore FIFO age after re-insertion.
        self.long
            .make_contiguous()
            .sort_by_key(|lot| lot.acquisition_date);

        if remaining > Decimal::ZERO {
            warn!(
                "transfer-in {} exceeds parked shares by {}; residual treated as acquisition",
                ev.tx_id, remaining
            );
            let residual = ReplayEvent {
                shares: remaining,
                value: ev.value_fraction(remaining),
                foreign_value: ev.foreign_fraction(remaining),
                ..ev.clone()
            };
            self.acquire(&residual);
        }
    }

    pub fn remaining_long(&self) -> impl Iterator<Item = &Lot> {
        self.long.iter()
    }

    pub fn remaining_short(&self) -> impl Iterator<Item = &Lot> {
        self.short.iter()
    }
}

/// Moving-average bookkeeping: one signed running total. A negative share
/// count is a short position whose `cost` holds the sale proceeds.
#[derive(Debug, Default)]
pub(crate) struct MovingAverageLedger {
    pub shares: Decimal,
    pub cost: Decimal,
    pub foreign: Option<Decimal>,
    parked: Option<(Decimal, Decimal, Option<Decimal>)>,
    pub realized: GainsAccumulator,
}

impl MovingAverageLedger {
    pub fn acquire(&mut self, ev: &ReplayEvent) {
        let mut remaining = ev.shares;

        if self.shares < Decimal::ZERO {
            // Cover at the average proceeds of the open short.
            let cover = remaining.min(-self.shares);
            let proceeds_removed = (self.cost * cover / -self.shares).round_dp(ROUNDING_SCALE);
            let foreign_removed = self
                .foreign
                .map(|f| (f * cover / -self.shares).round_dp(ROUNDING_SCALE));
            let cost_fraction = ev.value_fraction(cover);

            let gain = proceeds_removed - cost_fraction;
            let forex = match (foreign_removed, ev.rate) {
                (Some(foreign_proceeds), Some(rate)) => {
                    Some(round_amount(proceeds_removed) - round_amount(foreign_proceeds * rate))
                }
                _ => None,
            };
            if ev.in_interval {
                self.realized
                    .record(&ev.tx_id, &ev.tx_id, cover, gain, forex);
            }

            self.shares += cover;
            self.cost -= proceeds_removed;
            self.foreign = self.foreign.zip(foreign_removed).map(|(f, r)| f - r);
            remaining -= cover;
            if self.shares.is_zero() {
                self.cost = Decimal::ZERO;
                self.foreign = self.foreign.map(|_| Decimal::ZERO);
            }
        }

        if remaining > Decimal::ZERO {
            self.shares += remaining;
            self.cost += ev.value_fraction(remaining);
            self.foreign = match (self.foreign, ev.foreign_fraction(remaining)) {
                (Some(f), Some(add)) => Some(f + add),
                (None, Some(add)) => Some(add),
                (prev, None) => prev,
            };
        }
    }

    pub fn dispose(&mut self, ev: &ReplayEvent) {
        let mut remaining = ev.shares;

        if self.shares > Decimal::ZERO {
            // Remove at the current average cost per share.
            let sold = remaining.min(self.shares);
            let cost_removed = (self.cost * sold / self.shares).round_dp(ROUNDING_SCALE);
            let foreign_removed = self
                .foreign
                .map(|f| (f * sold / self.shares).round_dp(ROUNDING_SCALE));
            let proceeds_fraction = ev.value_fraction(sold);

            let gain = proceeds_fraction - cost_removed;
            let forex = match (foreign_removed, ev.rate) {
                (Some(foreign_cost), Some(rate)) => {
                    Some(round_amount(foreign_cost * rate) - round_amount(cost_removed))
                }
                _ => None,
            };
            if ev.in_interval {
                self.realized.record(&ev.tx_id, &ev.tx_id, sold, gain, forex);
            }

            self.shares -= sold;
            self.cost -= cost_removed;
            self.foreign = self.foreign.zip(foreign_removed).map(|(f, r)| f - r);
            remaining -= sold;
            if self.shares.is_zero() {
                self.cost = Decimal::ZERO;
                self.foreign = self.foreign.map(|_| Decimal::ZERO);
            }
        }

        if remaining > Decimal::ZERO {
            // Residual opens or extends a short position holding proceeds.
            self.shares -= remaining;
            self.cost += ev.value_fraction(remaining);
            self.foreign = match (self.foreign, ev.foreign_fraction(remaining)) {
                (Some(f), Some(add)) => Some(f + add),
                (None, Some(add)) => Some(add),
                (prev, None) => prev,
            };
        }
    }

    pub fn transfer_out(&mut self, ev: &ReplayEvent) -> Result<()> {
        if self.shares < ev.shares {
            return Err(CalculatorError::InconsistentHistory(format!(
                "transfer of {} shares exceeds held position (transaction {})",
                ev.shares, ev.tx_id
            ))
            .into());
        }

        let cost_removed = (self.cost * ev.shares / self.shares).round_dp(ROUNDING_SCALE);
        let foreign_removed = self
            .foreign
            .map(|f| (f * ev.shares / self.shares).round_dp(ROUNDING_SCALE));

        self.shares -= ev.shares;
        self.cost -= cost_removed;
        self.foreign = self.foreign.zip(foreign_removed).map(|(f, r)| f - r);
        if self.shares.is_zero() {
            self.cost = Decimal::ZERO;
            self.foreign = self.foreign.map(|_| Decimal::ZERO);
        }

        self.parked = Some((ev.shares, cost_removed, foreign_removed));
        Ok(())
    }

    pub fn transfer_in(&mut self, ev: &ReplayEvent) {
        match self.parked.take() {
            Some((shares, cost, foreign)) if shares == ev.shares => {
                self.shares += shares;
                self.cost += cost;
                self.foreign = match (self.foreign, foreign) {
                    (Some(f), Some(add)) => Some(f + add),
                    (None, Some(add)) => Some(add),
                    (prev, None) => prev,
                };
            }
            parked => {
                if parked.is_some() {
                    warn!(
                        "transfer-in {} does not match parked transfer; treating as acquisition",
                        ev.tx_id
                    );
                }
                self.acquire(ev);
            }
        }
    }
}
