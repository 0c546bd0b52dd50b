use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::{CalculatorError, Error};
use crate::money::Money;

/// The transaction kinds the engines understand.
///
/// Buys and inbound deliveries acquire shares; sells and outbound deliveries
/// dispose of them. Portfolio transfers move shares between portfolios and
/// carry their cost basis with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
    DeliveryInbound,
    DeliveryOutbound,
    TransferIn,
    TransferOut,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
            TransactionType::DeliveryInbound => "DELIVERY_INBOUND",
            TransactionType::DeliveryOutbound => "DELIVERY_OUTBOUND",
            TransactionType::TransferIn => "TRANSFER_IN",
            TransactionType::TransferOut => "TRANSFER_OUT",
        }
    }

    /// True if the transaction increases the position.
    pub fn is_acquisition(&self) -> bool {
        matches!(
            self,
            TransactionType::Buy
                | TransactionType::DeliveryInbound
                | TransactionType::TransferIn
        )
    }

    /// True if the transaction reduces the position.
    pub fn is_disposal(&self) -> bool {
        !self.is_acquisition()
    }

    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            TransactionType::TransferIn | TransactionType::TransferOut
        )
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            "DELIVERY_INBOUND" => Ok(TransactionType::DeliveryInbound),
            "DELIVERY_OUTBOUND" => Ok(TransactionType::DeliveryOutbound),
            "TRANSFER_IN" => Ok(TransactionType::TransferIn),
            "TRANSFER_OUT" => Ok(TransactionType::TransferOut),
            other => {
                Err(CalculatorError::UnsupportedTransactionType(other.to_string()).into())
            }
        }
    }
}

/// Optional currency-conversion unit recorded on a transaction: the gross
/// value in both currencies and the exchange rate actually realized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForexUnit {
    /// Gross value in the reporting-side currency of the transaction amount.
    pub gross_amount: Money,
    /// Gross value in the security's quote currency.
    pub gross_foreign: Money,
    /// Realized exchange rate (foreign -> amount currency).
    pub exchange_rate: Decimal,
}

/// One entry of a security's transaction history.
///
/// `sequence` is the stable insertion order used to break ties between
/// same-day transactions; it is assigned by the owning model layer and never
/// re-derived here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub security_id: String,
    pub date: NaiveDate,
    pub sequence: i64,
    pub tx_type: TransactionType,
    pub shares: Decimal,
    pub amount: Money,
    pub forex: Option<ForexUnit>,
}

/// Sorts a history chronologically with the insertion sequence as tie-break.
pub fn sort_chronologically(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.sequence.cmp(&b.sequence)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_round_trips_through_strings() {
        let all = [
            TransactionType::Buy,
            TransactionType::Sell,
            TransactionType::DeliveryInbound,
            TransactionType::DeliveryOutbound,
            TransactionType::TransferIn,
            TransactionType::TransferOut,
        ];
        for tx_type in all {
            assert_eq!(TransactionType::from_str(tx_type.as_str()).unwrap(), tx_type);
        }
    }

    #[test]
    fn unknown_transaction_type_is_rejected() {
        let err = TransactionType::from_str("DIVIDEND").unwrap_err();
        assert!(matches!(
            err,
            Error::Calculation(CalculatorError::UnsupportedTransactionType(ref s)) if s == "DIVIDEND"
        ));
    }
}
