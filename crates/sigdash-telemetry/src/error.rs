//! Telemetry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter {filter:?}: {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("Subscriber already installed: {0}")]
    AlreadyInstalled(String),

    #[error("Metrics encoding failed: {0}")]
    Encode(#[from] prometheus::Error),

    #[error("Metrics output is not UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
