use serde::{Deserialize, Serialize};

/// A security as seen by the calculation core: an identifier and the
/// currency its quotes are denominated in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub id: String,
    pub symbol: String,
    pub currency: String,
}

impl Security {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Security {
            id: id.into(),
            symbol: symbol.into(),
            currency: currency.into(),
        }
    }
}
