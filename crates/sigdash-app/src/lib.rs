//! sigdash terminal front end.
//!
//! Wires the engine client, alert engine and polling orchestrator together
//! and renders through `tracing`.

pub mod app;
pub mod config;
pub mod error;
pub mod sink;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use sink::TracingView;
