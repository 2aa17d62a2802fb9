//! Application configuration.
//!
//! Loaded from a TOML file, then overridden by `SIGDASH__SECTION__KEY`
//! environment variables (e.g. `SIGDASH__API__BASE_URL`).

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sigdash_alerts::AlertConfig;
use sigdash_client::REPORT_PAGE_SIZE;
use sigdash_core::DEFAULT_EXCHANGE_TZ;
use sigdash_sync::PollingConfig;
use std::path::Path;
use std::time::Duration;

/// Default config path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "SIGDASH_CONFIG";

/// Prefix of per-key environment overrides.
pub const ENV_PREFIX: &str = "SIGDASH";

/// Engine API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport timeout per request (ms). Default: 10,000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api/".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Market session countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// IANA zone of the exchange.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Countdown refresh period (ms). Default: 1,000.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_timezone() -> String {
    DEFAULT_EXCHANGE_TZ.to_string()
}

fn default_tick_ms() -> u64 {
    1_000
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            tick_ms: default_tick_ms(),
        }
    }
}

/// Agent report pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Rows per page. Must equal the server's own page-size limit.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    REPORT_PAGE_SIZE
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Logging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset, e.g. `"info,sigdash=debug"`.
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Resolve the config path: explicit argument, then `SIGDASH_CONFIG`,
    /// then the default path.
    pub fn resolve_path(explicit: Option<String>) -> String {
        explicit
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load `path` (optional) and apply environment overrides.
    ///
    /// A missing file is not an error: defaults plus overrides are used.
    pub fn load(path: &str) -> AppResult<Self> {
        if !Path::new(path).exists() {
            tracing::warn!(path = %path, "Config file not found, using defaults");
        }

        let config: Self = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file only, without environment overrides.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::Config("api.base_url must not be empty".to_string()));
        }
        if self.api.timeout_ms == 0 {
            return Err(AppError::Config("api.timeout_ms must be positive".to_string()));
        }

        let intervals = [
            ("polling.worker_ms", self.polling.worker_ms),
            ("polling.sidebar_ms", self.polling.sidebar_ms),
            ("polling.alerts_ms", self.polling.alerts_ms),
            ("polling.quotes_ms", self.polling.quotes_ms),
            ("polling.optimizer_ms", self.polling.optimizer_ms),
            ("clock.tick_ms", self.clock.tick_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, ms)| *ms == 0) {
            return Err(AppError::Config(format!("{name} must be positive")));
        }

        if self.report.page_size == 0 {
            return Err(AppError::Config("report.page_size must be positive".to_string()));
        }
        if self.report.page_size != REPORT_PAGE_SIZE {
            tracing::warn!(
                page_size = self.report.page_size,
                server_page_size = REPORT_PAGE_SIZE,
                "report.page_size differs from the server limit; page counts may be wrong"
            );
        }

        self.alerts.validate()?;
        Ok(())
    }

    /// Polling settings with the countdown period taken from `clock`.
    pub fn polling_config(&self) -> PollingConfig {
        PollingConfig {
            countdown_ms: self.clock.tick_ms,
            ..self.polling.clone()
        }
    }
}
