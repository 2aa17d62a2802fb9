//! The engine API as seen by the polling layer.
//!
//! `ApiClient` is the HTTP implementation; tests substitute in-memory fakes.

use crate::error::ClientResult;
use async_trait::async_trait;
use sigdash_core::{
    AgentReport, DiscardedCount, OptimizerReport, PortfolioHolding, QuoteSnapshot, SystemAlert,
    TradeOrder, TradeSide, WorkerCommand, WorkerStatus,
};

/// Page size of `virtual-agent/report`. Must equal the server's own limit,
/// otherwise page counts computed here diverge from what the server returns.
pub const REPORT_PAGE_SIZE: u32 = 200;

/// Remote signal-engine API.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// `GET worker/status`.
    async fn worker_status(&self) -> ClientResult<WorkerStatus>;

    /// `POST worker/control/{start|pause|resume}`.
    async fn worker_control(&self, command: WorkerCommand) -> ClientResult<()>;

    /// `GET candidates/phase1`.
    async fn candidates(&self) -> ClientResult<Vec<serde_json::Value>>;

    /// `GET results/phase2`.
    async fn results(&self) -> ClientResult<Vec<serde_json::Value>>;

    /// `GET signals/phase3`.
    async fn signals(&self) -> ClientResult<Vec<serde_json::Value>>;

    /// `GET signals/discarded-count-24h`.
    async fn discarded_count(&self) -> ClientResult<DiscardedCount>;

    /// `GET system/alert`.
    async fn system_alert(&self) -> ClientResult<SystemAlert>;

    /// `GET portfolio`.
    async fn portfolio(&self) -> ClientResult<Vec<PortfolioHolding>>;

    /// `POST portfolio/buy` or `POST portfolio/sell`.
    async fn trade(
        &self,
        side: TradeSide,
        order: &TradeOrder,
    ) -> ClientResult<Option<serde_json::Value>>;

    /// `GET quote/{ticker}`, normalized.
    async fn quote(&self, ticker: &str) -> ClientResult<QuoteSnapshot>;

    /// `GET virtual-agent/report?page=&page_size=`.
    async fn agent_report(&self, page: u32, page_size: u32) -> ClientResult<AgentReport>;

    /// `POST backtest/request`.
    async fn request_backtest(&self, year: i32) -> ClientResult<Option<serde_json::Value>>;

    /// `POST ai-optimizer/request`.
    async fn request_optimizer(&self) -> ClientResult<Option<serde_json::Value>>;

    /// `GET ai-optimizer/report`.
    async fn optimizer_report(&self) -> ClientResult<OptimizerReport>;
}
