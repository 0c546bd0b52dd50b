use rust_decimal::Decimal;

use crate::taxonomies::Classification;

/// Contract for the classification-assignment capability: which categories a
/// security belongs to, with fractional weights in [0, 1].
pub trait TaxonomyProviderTrait: Send + Sync {
    fn classifications_for(&self, security_id: &str) -> Vec<(Classification, Decimal)>;
}
