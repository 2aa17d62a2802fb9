//! Alert engine for the sigdash dashboard client.
//!
//! - `classify`: dedup key and display style of free-text messages
//! - `dedup`: snooze table, active alerts, auto and user dismissal
//! - `profit`: edge-triggered profit threshold alerts

pub mod classify;
pub mod config;
pub mod dedup;
pub mod error;
pub mod profit;

pub use classify::{
    classify_key, classify_style, is_ticker_shaped, AlertKey, AlertKind, AlertStyle,
    UNKNOWN_TICKER,
};
pub use config::AlertConfig;
pub use dedup::{
    AlertDeduplicator, AlertId, AlertRecord, AlertSink, PresentOutcome, NO_ALERT_SENTINEL,
};
pub use error::{AlertError, AlertResult};
pub use profit::ProfitAlertMonitor;
