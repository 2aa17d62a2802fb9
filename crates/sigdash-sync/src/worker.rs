//! Worker panel state derived from each status poll.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sigdash_core::{Progress, WorkerCommand, WorkerPhase, WorkerState, WorkerStatus};

/// Liveness of the remote worker as judged from its heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HeartbeatState {
    /// No heartbeat reported yet.
    Unknown,
    Alive { age_ms: i64 },
    Interrupted { age_ms: i64 },
}

impl HeartbeatState {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

/// Everything the worker panel displays.
///
/// Progress and log are only filled while the dashboard view is mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerPanelState {
    pub status: Option<WorkerState>,
    pub phase: WorkerPhase,
    pub heartbeat: HeartbeatState,
    pub start_enabled: bool,
    pub pause_enabled: bool,
    pub resume_enabled: bool,
    pub progress: Option<Progress>,
    pub log: Option<String>,
}

impl Default for WorkerPanelState {
    /// Before the first poll every control is disabled.
    fn default() -> Self {
        Self {
            status: None,
            phase: WorkerPhase::None,
            heartbeat: HeartbeatState::Unknown,
            start_enabled: false,
            pause_enabled: false,
            resume_enabled: false,
            progress: None,
            log: None,
        }
    }
}

impl WorkerPanelState {
    pub fn from_status(
        status: &WorkerStatus,
        now: DateTime<Utc>,
        heartbeat_stale_ms: u64,
        dashboard_mounted: bool,
    ) -> Self {
        let heartbeat = match status.heartbeat_age_ms(now) {
            None => HeartbeatState::Unknown,
            Some(age_ms) if status.is_heartbeat_stale(now, heartbeat_stale_ms) => {
                HeartbeatState::Interrupted { age_ms }
            }
            Some(age_ms) => HeartbeatState::Alive { age_ms },
        };

        let state = status.status;
        Self {
            status: Some(state),
            phase: status.phase.clone(),
            heartbeat,
            start_enabled: matches!(state, WorkerState::Idle | WorkerState::Error),
            pause_enabled: state == WorkerState::Running,
            resume_enabled: state == WorkerState::Paused,
            progress: dashboard_mounted.then_some(status.progress),
            log: dashboard_mounted.then(|| status.log.clone()),
        }
    }

    /// Whether the control for `command` is currently enabled.
    pub fn allows(&self, command: WorkerCommand) -> bool {
        match command {
            WorkerCommand::Start => self.start_enabled,
            WorkerCommand::Pause => self.pause_enabled,
            WorkerCommand::Resume => self.resume_enabled,
        }
    }

    /// Status line, e.g. `RUNNING (SCANNING)` or `RUNNING (interrupted)`.
    pub fn status_label(&self) -> String {
        let Some(state) = self.status else {
            return "UNKNOWN".to_string();
        };
        if self.heartbeat.is_interrupted() {
            return format!("{state} (interrupted)");
        }
        match &self.phase {
            WorkerPhase::None => state.to_string(),
            phase => format!("{state} ({phase})"),
        }
    }
}
