//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] sigdash_client::ClientError),

    #[error("Sync error: {0}")]
    Sync(#[from] sigdash_sync::SyncError),

    #[error("Alert error: {0}")]
    Alert(#[from] sigdash_alerts::AlertError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] sigdash_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
