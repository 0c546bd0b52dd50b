//! Currency conversion seam and an in-memory rate table implementation.

mod currency_converter;
mod fx_traits;

pub use currency_converter::*;
pub use fx_traits::*;
