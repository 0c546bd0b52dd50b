use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::constants::DECIMAL_PRECISION;
use crate::errors::{CurrencyError, Result};

/// An immutable monetary amount in a single currency.
///
/// Arithmetic between two `Money` values requires equal currencies; combining
/// amounts across currencies must go through an explicit conversion step in
/// the `fx` module. Amounts are kept at full precision internally; `rounded`
/// applies the half-up rounding rule at [`DECIMAL_PRECISION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Money {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Money::new(Decimal::ZERO, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Half-up rounding at the configured monetary precision.
    pub fn rounded(&self) -> Self {
        Money {
            amount: round_amount(self.amount),
            currency: self.currency.clone(),
        }
    }

    pub fn try_add(&self, other: &Money) -> Result<Money> {
        self.check_currency(other)?;
        Ok(Money::new(self.amount + other.amount, self.currency.clone()))
    }

    pub fn try_sub(&self, other: &Money) -> Result<Money> {
        self.check_currency(other)?;
        Ok(Money::new(self.amount - other.amount, self.currency.clone()))
    }

    /// Scales the amount by a weight and rounds half-up. Used for weighted
    /// attribution of a trade to a category.
    pub fn multiply_and_round(&self, weight: Decimal) -> Money {
        Money {
            amount: round_amount(self.amount * weight),
            currency: self.currency.clone(),
        }
    }

    fn check_currency(&self, other: &Money) -> Result<()> {
        if self.currency != other.currency {
            return Err(CurrencyError::Mismatch {
                expected: self.currency.clone(),
                actual: other.currency.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Half-up (away from zero at the midpoint) at [`DECIMAL_PRECISION`].
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}
