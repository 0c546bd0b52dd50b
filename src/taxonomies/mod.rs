//! Classification model and the assignment-weight seam.

mod taxonomy_model;
mod taxonomy_traits;

pub use taxonomy_model::*;
pub use taxonomy_traits::*;
