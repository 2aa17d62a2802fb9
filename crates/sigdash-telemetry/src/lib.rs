//! Prometheus metrics and structured logging for sigdash.

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, DEFAULT_FILTER};
pub use metrics::Metrics;
