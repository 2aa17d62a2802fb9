//! Views and the sink that renders them.

use crate::paginator::ReportPage;
use crate::portfolio::HoldingRow;
use crate::worker::WorkerPanelState;
use serde::{Deserialize, Serialize};
use sigdash_core::{Countdown, OptimizerReport, SidebarSummary};
use std::fmt;
use std::str::FromStr;

/// Top-level dashboard views. Some loops only run while their view is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Dashboard,
    Portfolio,
    Report,
    Optimizer,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Portfolio => "portfolio",
            Self::Report => "report",
            Self::Optimizer => "optimizer",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(Self::Dashboard),
            "portfolio" => Ok(Self::Portfolio),
            "report" => Ok(Self::Report),
            "optimizer" => Ok(Self::Optimizer),
            other => Err(format!(
                "unknown view '{other}' (expected dashboard, portfolio, report or optimizer)"
            )),
        }
    }
}

/// Severity of an inline notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Optimizer panel update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizerUpdate {
    /// Job accepted or still running.
    Processing,
    /// Finished; carries the report to display.
    Done(OptimizerReport),
    /// Failed or unknown to the server; carries the message to display.
    Failed(String),
    /// Last known report, shown when the view is entered.
    Snapshot(OptimizerReport),
}

/// Receives every state change the dashboard shows.
///
/// Implementations must not block: calls happen from polling tasks.
#[cfg_attr(test, mockall::automock)]
pub trait ViewSink: Send + Sync {
    fn connectivity(&self, online: bool);
    fn worker_panel(&self, panel: &WorkerPanelState);
    fn sidebar(&self, summary: &SidebarSummary);
    fn portfolio(&self, rows: &[HoldingRow]);
    fn countdown(&self, countdown: &Countdown);
    fn report_page(&self, page: &ReportPage);
    fn optimizer(&self, update: &OptimizerUpdate);
    fn controls_enabled(&self, enabled: bool);
    fn notice(&self, level: NoticeLevel, message: &str);
}
