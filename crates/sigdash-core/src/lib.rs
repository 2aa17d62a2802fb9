//! Core domain types for the sigdash dashboard client.
//!
//! This crate provides the shapes shared by every other crate:
//! - `Price`, `Quantity`: exact decimal newtypes
//! - `WorkerStatus`, `PortfolioHolding`, `QuoteSnapshot`: engine snapshots
//! - `MarketClock`, `Countdown`: exchange session countdown

pub mod decimal;
pub mod error;
pub mod session;
pub mod types;

pub use decimal::{Price, Quantity};
pub use error::{CoreError, Result};
pub use session::{
    compute_countdown, format_remaining, session_at, Countdown, CountdownTarget, MarketClock,
    MarketSession, DEFAULT_EXCHANGE_TZ,
};
pub use types::{
    AgentReport, BacktestRequest, DiscardedCount, OptimizerReport, OptimizerStatus,
    PortfolioHolding, Progress, QuoteSnapshot, SidebarSummary, SystemAlert, TradeOrder,
    TradeSide, WorkerCommand, WorkerPhase, WorkerState, WorkerStatus,
};
