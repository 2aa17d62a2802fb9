//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,sigdash=debug";

/// Initialize structured logging.
///
/// `RUST_LOG` wins over `fallback_filter`. With `RUST_ENV=production` events
/// are emitted as JSON, otherwise in the pretty development format.
pub fn init_logging(fallback_filter: Option<&str>) -> TelemetryResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let filter = fallback_filter.unwrap_or(DEFAULT_FILTER);
            EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
                filter: filter.to_string(),
                message: e.to_string(),
            })?
        }
    };

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let result = if is_production {
        // JSON format for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        // Pretty format for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init()
    };

    result.map_err(|e| TelemetryError::AlreadyInstalled(e.to_string()))
}
