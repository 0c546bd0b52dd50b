//! Read-only security model consumed by the engines.

mod securities_model;

pub use securities_model::*;
