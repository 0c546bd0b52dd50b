//! Transaction history model and the quote lookup seam.

mod quotes_traits;
mod transactions_model;

pub use quotes_traits::*;
pub use transactions_model::*;
