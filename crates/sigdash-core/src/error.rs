//! Error types for sigdash-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Cannot sell {requested} {ticker}: only {held} held")]
    InsufficientHolding {
        ticker: String,
        held: String,
        requested: String,
    },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
