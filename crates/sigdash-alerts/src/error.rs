//! Alert engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Invalid alert configuration: {0}")]
    InvalidConfig(String),
}

pub type AlertResult<T> = Result<T, AlertError>;
