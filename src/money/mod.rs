//! Monetary value type with equal-currency arithmetic.

mod money_model;

pub use money_model::*;
