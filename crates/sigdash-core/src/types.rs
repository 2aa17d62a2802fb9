//! Wire-level data shapes exchanged with the signal engine.
//!
//! Everything here is a snapshot: each poll replaces the previous value
//! wholesale, nothing is merged field by field.

use crate::error::{CoreError, Result};
use crate::{Price, Quantity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the remote scan worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkerState {
    Idle,
    Running,
    Paused,
    Error,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Running => write!(f, "RUNNING"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Phase the worker is currently executing.
///
/// The server may add phases at any time, so unrecognised values are kept
/// verbatim in `Other` instead of failing the whole status payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkerPhase {
    None,
    Scanning,
    Backtesting,
    AiOptimizing,
    Other(String),
}

impl From<String> for WorkerPhase {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "NONE" | "" => Self::None,
            "SCANNING" => Self::Scanning,
            "BACKTESTING" => Self::Backtesting,
            "AI_OPTIMIZING" => Self::AiOptimizing,
            _ => Self::Other(raw),
        }
    }
}

impl From<WorkerPhase> for String {
    fn from(phase: WorkerPhase) -> Self {
        phase.to_string()
    }
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::Scanning => write!(f, "SCANNING"),
            Self::Backtesting => write!(f, "BACKTESTING"),
            Self::AiOptimizing => write!(f, "AI_OPTIMIZING"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Scan progress counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub total: u64,
}

impl Progress {
    /// Completion in whole percent, 0 when the total is unknown.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.processed.min(self.total) * 100 / self.total;
        pct as u8
    }
}

/// `GET worker/status` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub status: WorkerState,
    pub phase: WorkerPhase,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl WorkerStatus {
    /// Milliseconds since the last heartbeat, `None` when no heartbeat was ever seen.
    pub fn heartbeat_age_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_heartbeat
            .map(|hb| (now - hb).num_milliseconds().max(0))
    }

    /// True when a heartbeat exists and is older than `threshold_ms`.
    pub fn is_heartbeat_stale(&self, now: DateTime<Utc>, threshold_ms: u64) -> bool {
        self.heartbeat_age_ms(now)
            .is_some_and(|age| age > threshold_ms as i64)
    }
}

/// Worker control commands (`POST worker/control/{action}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerCommand {
    Start,
    Pause,
    Resume,
}

impl WorkerCommand {
    pub fn as_path(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
        }
    }
}

impl fmt::Display for WorkerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// One position in the portfolio (`GET portfolio`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioHolding {
    pub ticker: String,
    pub quantity: Quantity,
    pub average_buy_price: Price,
    #[serde(default)]
    pub take_profit: Option<Price>,
}

impl PortfolioHolding {
    /// Check the holding invariants (`quantity > 0`, `average_buy_price > 0`).
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(CoreError::InvalidTicker("empty ticker".to_string()));
        }
        if !self.quantity.is_positive() {
            return Err(CoreError::InvalidQuantity(format!(
                "{} quantity must be positive, got {}",
                self.ticker, self.quantity
            )));
        }
        if !self.average_buy_price.is_positive() {
            return Err(CoreError::InvalidPrice(format!(
                "{} average buy price must be positive, got {}",
                self.ticker, self.average_buy_price
            )));
        }
        Ok(())
    }

    /// Cost basis of the position.
    pub fn cost_basis(&self) -> rust_decimal::Decimal {
        self.quantity * self.average_buy_price
    }
}

/// Normalized live quote for a held ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub price: Price,
    pub change: rust_decimal::Decimal,
    pub change_percent: rust_decimal::Decimal,
    pub previous_close: Price,
    /// Latest trading day reported by the quote source.
    pub as_of: Option<NaiveDate>,
}

/// Aggregated sidebar counters, fetched together as one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarSummary {
    pub candidates: usize,
    pub results: usize,
    pub signals: usize,
    pub discarded_24h: u64,
}

/// `GET signals/discarded-count-24h` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DiscardedCount {
    pub discarded_count_24h: u64,
}

/// `GET system/alert` payload. `"NONE"` means there is nothing to show.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemAlert {
    #[serde(default)]
    pub message: String,
}

/// Server-reported state of the background optimizer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptimizerStatus {
    #[default]
    None,
    Processing,
    Done,
    Error,
}

/// `GET ai-optimizer/report` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptimizerReport {
    #[serde(default)]
    pub status: OptimizerStatus,
    #[serde(default)]
    pub report_text: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// `GET virtual-agent/report` payload. Stats and trade rows are rendered
/// as-is, so they stay untyped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentReport {
    #[serde(default)]
    pub stats: serde_json::Value,
    #[serde(default)]
    pub trades: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_trades_count: u64,
}

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_path(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// Body of `POST portfolio/buy` and `POST portfolio/sell`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOrder {
    pub ticker: String,
    pub quantity: Quantity,
    pub price_per_share: Price,
}

impl TradeOrder {
    /// Build an order, rejecting empty tickers and non-positive amounts.
    ///
    /// Tickers are upper-cased so that they match portfolio keys.
    pub fn new(ticker: &str, quantity: Quantity, price_per_share: Price) -> Result<Self> {
        let ticker = ticker.trim().to_ascii_uppercase();
        if ticker.is_empty() {
            return Err(CoreError::InvalidTicker("empty ticker".to_string()));
        }
        if !quantity.is_positive() {
            return Err(CoreError::InvalidQuantity(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        if !price_per_share.is_positive() {
            return Err(CoreError::InvalidPrice(format!(
                "price must be positive, got {price_per_share}"
            )));
        }
        Ok(Self {
            ticker,
            quantity,
            price_per_share,
        })
    }
}

/// Body of `POST backtest/request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub year: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_worker_status_parses_with_defaults() {
        let raw = r#"{"status":"RUNNING","phase":"NONE"}"#;
        let status: WorkerStatus = serde_json::from_str(raw).unwrap();
        assert_eq!(status.status, WorkerState::Running);
        assert_eq!(status.phase, WorkerPhase::None);
        assert_eq!(status.progress, Progress::default());
        assert!(status.last_heartbeat.is_none());
    }

    #[test]
    fn test_unknown_phase_is_preserved() {
        let raw = r#"{"status":"RUNNING","phase":"REBALANCING","progress":{"processed":5,"total":10}}"#;
        let status: WorkerStatus = serde_json::from_str(raw).unwrap();
        assert_eq!(status.phase, WorkerPhase::Other("REBALANCING".to_string()));
        assert_eq!(status.phase.to_string(), "REBALANCING");
        assert_eq!(status.progress.percent(), 50);
    }

    #[test]
    fn test_progress_percent_edges() {
        assert_eq!(Progress { processed: 0, total: 0 }.percent(), 0);
        assert_eq!(Progress { processed: 12, total: 10 }.percent(), 100);
        assert_eq!(Progress { processed: 1, total: 3 }.percent(), 33);
    }

    #[test]
    fn test_heartbeat_staleness() {
        let hb = Utc.with_ymd_and_hms(2026, 2, 9, 15, 0, 0).unwrap();
        let status = WorkerStatus {
            status: WorkerState::Running,
            phase: WorkerPhase::Scanning,
            progress: Progress::default(),
            log: String::new(),
            last_heartbeat: Some(hb),
        };
        let fresh = hb + chrono::Duration::seconds(30);
        let stale = hb + chrono::Duration::seconds(31);
        assert!(!status.is_heartbeat_stale(fresh, 30_000));
        assert!(status.is_heartbeat_stale(stale, 30_000));
    }

    #[test]
    fn test_missing_heartbeat_is_not_stale() {
        let status = WorkerStatus {
            status: WorkerState::Idle,
            phase: WorkerPhase::None,
            progress: Progress::default(),
            log: String::new(),
            last_heartbeat: None,
        };
        assert!(!status.is_heartbeat_stale(Utc::now(), 30_000));
    }

    #[test]
    fn test_holding_validation() {
        let holding = PortfolioHolding {
            ticker: "AAPL".to_string(),
            quantity: Quantity::new(dec!(10)),
            average_buy_price: Price::new(dec!(100)),
            take_profit: None,
        };
        assert!(holding.validate().is_ok());
        assert_eq!(holding.cost_basis(), dec!(1000));

        let bad = PortfolioHolding {
            quantity: Quantity::ZERO,
            ..holding
        };
        assert!(matches!(bad.validate(), Err(CoreError::InvalidQuantity(_))));
    }

    #[test]
    fn test_holding_accepts_numeric_json() {
        let raw = r#"[{"ticker":"MSFT","quantity":5,"average_buy_price":"410.5","take_profit":450.0}]"#;
        let holdings: Vec<PortfolioHolding> = serde_json::from_str(raw).unwrap();
        assert_eq!(holdings[0].quantity.inner(), dec!(5));
        assert_eq!(holdings[0].average_buy_price.inner(), dec!(410.5));
        assert_eq!(holdings[0].take_profit.map(|p| p.inner()), Some(dec!(450)));
    }

    #[test]
    fn test_trade_order_validation() {
        let order =
            TradeOrder::new(" aapl ", Quantity::new(dec!(2)), Price::new(dec!(150))).unwrap();
        assert_eq!(order.ticker, "AAPL");

        assert!(matches!(
            TradeOrder::new("AAPL", Quantity::new(dec!(-1)), Price::new(dec!(150))),
            Err(CoreError::InvalidQuantity(_))
        ));
        assert!(matches!(
            TradeOrder::new("AAPL", Quantity::new(dec!(1)), Price::ZERO),
            Err(CoreError::InvalidPrice(_))
        ));
        assert!(matches!(
            TradeOrder::new("  ", Quantity::new(dec!(1)), Price::new(dec!(1))),
            Err(CoreError::InvalidTicker(_))
        ));
    }

    #[test]
    fn test_optimizer_report_defaults() {
        let report: OptimizerReport = serde_json::from_str(r#"{"status":"PROCESSING"}"#).unwrap();
        assert_eq!(report.status, OptimizerStatus::Processing);
        assert!(report.report_text.is_none());
    }

    #[test]
    fn test_worker_command_paths() {
        assert_eq!(WorkerCommand::Start.as_path(), "start");
        assert_eq!(WorkerCommand::Resume.to_string(), "resume");
    }
}
