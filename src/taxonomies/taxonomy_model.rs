use serde::{Deserialize, Serialize};

/// A node of a classification tree (e.g. "Stocks", "Emerging Markets").
/// The tree itself is owned by the caller's model layer; the aggregation
/// pass only needs identity and a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub id: String,
    pub name: String,
}

impl Classification {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Classification {
            id: id.into(),
            name: name.into(),
        }
    }
}
