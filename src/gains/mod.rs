//! Lot ledger / capital gains engine.
//!
//! Replays a security's transaction history once, feeding a FIFO lot queue
//! and a moving-average cost in parallel, and produces realized and
//! unrealized capital gains records with a security/forex split for both
//! conventions.

mod gains_calculator;
mod gains_model;
mod lot_ledger;

pub use gains_calculator::*;
pub use gains_model::*;
