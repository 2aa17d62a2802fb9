//! Polling and view synchronization for the sigdash dashboard client.
//!
//! `PollingOrchestrator` keeps a `DashboardContext` in step with the engine
//! through independent, cancellable loops and pushes every change to a
//! `ViewSink`. Alerts flow through `sigdash_alerts`.

pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod paginator;
pub mod portfolio;
pub mod task;
pub mod view;
pub mod worker;

#[cfg(test)]
mod testing;

pub use config::PollingConfig;
pub use context::{DashboardContext, OptimizerState, QuoteCell};
pub use error::{SyncError, SyncResult};
pub use orchestrator::PollingOrchestrator;
pub use paginator::{page_count, ReportPage, ReportPaginator};
pub use portfolio::{HoldingRow, PortfolioDesk, Valuation, PARSE_ERROR_PLACEHOLDER};
pub use task::{spawn_polling, spawn_ticker, LoopControl, LoopHandle, LoopKind};
pub use view::{NoticeLevel, OptimizerUpdate, View, ViewSink};
pub use worker::{HeartbeatState, WorkerPanelState};
