//! Lotledger - capital gains and trade statistics over transaction histories.
//!
//! This crate contains the pure calculation core: it replays a security's
//! chronologically ordered transaction history to reconstruct cost basis
//! under FIFO and moving-average conventions, segments the history into
//! discrete trades, and aggregates trades into weighted category statistics
//! including a money-weighted rate of return. It owns no persistence and
//! performs no I/O; currency conversion, quotes, and classification weights
//! are supplied by the caller through traits.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod gains;
pub mod math;
pub mod money;
pub mod securities;
pub mod taxonomies;
pub mod trades;
pub mod transactions;
pub mod utils;

// Re-export common types
pub use fx::{CurrencyConverter, CurrencyConverterTrait};
pub use gains::{CapitalGainsCalculator, CapitalGainsRecord, Convention, GainsKind};
pub use money::Money;
pub use trades::{Trade, TradeCategory, TradeCollector, TradeElement, TradeTotals};
pub use transactions::{QuoteProviderTrait, Transaction, TransactionType};
pub use utils::Interval;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
