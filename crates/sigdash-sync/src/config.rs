//! Polling cadence configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Loop intervals and thresholds for the polling orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Worker status poll interval (ms). Default: 5000.
    #[serde(default = "default_worker_ms")]
    pub worker_ms: u64,
    /// Sidebar batch poll interval (ms). Default: 15000.
    #[serde(default = "default_sidebar_ms")]
    pub sidebar_ms: u64,
    /// System alert feed poll interval (ms). Default: 7000.
    #[serde(default = "default_alerts_ms")]
    pub alerts_ms: u64,
    /// Portfolio quote refresh interval (ms). Default: 30000.
    #[serde(default = "default_quotes_ms")]
    pub quotes_ms: u64,
    /// Optimizer report poll interval while a job is outstanding (ms). Default: 5000.
    #[serde(default = "default_optimizer_ms")]
    pub optimizer_ms: u64,
    /// Countdown tick (ms). Default: 1000.
    #[serde(default = "default_countdown_ms")]
    pub countdown_ms: u64,
    /// Heartbeat age after which the worker is shown as interrupted (ms). Default: 30000.
    #[serde(default = "default_heartbeat_stale_ms")]
    pub heartbeat_stale_ms: u64,
}

fn default_worker_ms() -> u64 {
    5_000
}

fn default_sidebar_ms() -> u64 {
    15_000
}

fn default_alerts_ms() -> u64 {
    7_000
}

fn default_quotes_ms() -> u64 {
    30_000
}

fn default_optimizer_ms() -> u64 {
    5_000
}

fn default_countdown_ms() -> u64 {
    1_000
}

fn default_heartbeat_stale_ms() -> u64 {
    30_000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            worker_ms: default_worker_ms(),
            sidebar_ms: default_sidebar_ms(),
            alerts_ms: default_alerts_ms(),
            quotes_ms: default_quotes_ms(),
            optimizer_ms: default_optimizer_ms(),
            countdown_ms: default_countdown_ms(),
            heartbeat_stale_ms: default_heartbeat_stale_ms(),
        }
    }
}

impl PollingConfig {
    pub fn worker_interval(&self) -> Duration {
        Duration::from_millis(self.worker_ms)
    }

    pub fn sidebar_interval(&self) -> Duration {
        Duration::from_millis(self.sidebar_ms)
    }

    pub fn alerts_interval(&self) -> Duration {
        Duration::from_millis(self.alerts_ms)
    }

    pub fn quotes_interval(&self) -> Duration {
        Duration::from_millis(self.quotes_ms)
    }

    pub fn optimizer_interval(&self) -> Duration {
        Duration::from_millis(self.optimizer_ms)
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_ms)
    }
}
