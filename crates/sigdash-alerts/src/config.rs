//! Alert engine configuration.

use crate::error::{AlertError, AlertResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Alert timing and threshold configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Time an alert stays on screen before it removes itself (ms). Default: 20,000.
    #[serde(default = "default_auto_dismiss_ms")]
    pub auto_dismiss_ms: u64,
    /// Suppression window after a user dismisses an alert (ms). Default: 1,800,000 (30 min).
    #[serde(default = "default_snooze_ms")]
    pub snooze_ms: u64,
    /// Price / average-buy-price ratio at which a profit alert fires. Default: 1.02.
    #[serde(default = "default_profit_threshold")]
    pub profit_threshold: Decimal,
}

fn default_auto_dismiss_ms() -> u64 {
    20_000
}

fn default_snooze_ms() -> u64 {
    1_800_000
}

fn default_profit_threshold() -> Decimal {
    dec!(1.02)
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            auto_dismiss_ms: default_auto_dismiss_ms(),
            snooze_ms: default_snooze_ms(),
            profit_threshold: default_profit_threshold(),
        }
    }
}

impl AlertConfig {
    pub fn auto_dismiss(&self) -> Duration {
        Duration::from_millis(self.auto_dismiss_ms)
    }

    pub fn snooze(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.snooze_ms as i64)
    }

    /// Reject thresholds that would fire on every position.
    pub fn validate(&self) -> AlertResult<()> {
        if self.profit_threshold <= Decimal::ONE {
            return Err(AlertError::InvalidConfig(format!(
                "profit_threshold must be above 1, got {}",
                self.profit_threshold
            )));
        }
        if self.auto_dismiss_ms == 0 {
            return Err(AlertError::InvalidConfig(
                "auto_dismiss_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AlertConfig::default();
        assert_eq!(config.auto_dismiss(), Duration::from_secs(20));
        assert_eq!(config.snooze(), chrono::Duration::minutes(30));
        assert_eq!(config.profit_threshold, dec!(1.02));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_threshold_at_one() {
        let config = AlertConfig {
            profit_threshold: dec!(1.0),
            ..AlertConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AlertConfig = toml::from_str("snooze_ms = 60000").unwrap();
        assert_eq!(config.snooze_ms, 60_000);
        assert_eq!(config.auto_dismiss_ms, 20_000);
        assert_eq!(config.profit_threshold, dec!(1.02));
    }
}
