//! Trade lifecycle: segmentation of a transaction history into discrete
//! trades, weighted aggregation into classification categories, and the
//! category-level money-weighted return.

mod trade_category;
mod trade_collector;
mod trade_element;
mod trades_model;

pub use trade_category::*;
pub use trade_collector::*;
pub use trade_element::*;
pub use trades_model::*;

#[cfg(test)]
mod trade_collector_tests;

#[cfg(test)]
mod trade_category_tests;
