use thiserror::Error;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the calculation core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Currency operation failed: {0}")]
    Currency(#[from] CurrencyError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Faults raised while replaying a transaction history. These indicate a
/// corrupted or mis-modeled history and propagate to the caller uncaught.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Inconsistent transaction history: {0}")]
    InconsistentHistory(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Unsupported transaction type: {0}")]
    UnsupportedTransactionType(String),
}

#[derive(Error, Debug)]
pub enum CurrencyError {
    #[error("No exchange rate available for {from}/{to} on {date}")]
    MissingRate {
        from: String,
        to: String,
        date: chrono::NaiveDate,
    },

    #[error("Currency mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

// Add From implementation for rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}
