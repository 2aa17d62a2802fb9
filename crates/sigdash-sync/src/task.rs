//! Cancellable polling tasks.
//!
//! A polling loop runs one tick, waits, and only then arms the next tick, so
//! a slow request delays the schedule instead of stacking up requests. Every
//! wait and every tick races the loop's cancellation token: once cancelled, a
//! loop never writes again.

use serde::Serialize;
use sigdash_telemetry::Metrics;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Identifies one of the orchestrator's loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    Worker,
    Sidebar,
    Alerts,
    Quotes,
    Optimizer,
    Countdown,
}

impl LoopKind {
    pub const ALL: [LoopKind; 6] = [
        Self::Worker,
        Self::Sidebar,
        Self::Alerts,
        Self::Quotes,
        Self::Optimizer,
        Self::Countdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Sidebar => "sidebar",
            Self::Alerts => "alerts",
            Self::Quotes => "quotes",
            Self::Optimizer => "optimizer",
            Self::Countdown => "countdown",
        }
    }
}

impl fmt::Display for LoopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a tick wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Handle to a running loop.
#[derive(Debug)]
pub struct LoopHandle {
    kind: LoopKind,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl LoopHandle {
    pub fn kind(&self) -> LoopKind {
        self.kind
    }

    /// Cancel the pending wait or in-flight tick.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// False once cancelled or once the loop stopped itself.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }

    /// Cancel and wait for the task to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.task.await;
    }
}

/// Spawn a self-rescheduling loop: tick, then wait `interval`, then tick again.
///
/// The first tick runs immediately.
pub fn spawn_polling<F, Fut>(kind: LoopKind, interval: Duration, mut tick: F) -> LoopHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = LoopControl> + Send + 'static,
{
    let token = CancellationToken::new();
    let loop_token = token.clone();

    let task = tokio::spawn(async move {
        Metrics::loop_active(kind.as_str(), true);
        debug!(loop_name = %kind, interval_ms = interval.as_millis() as u64, "Loop armed");

        loop {
            let control = tokio::select! {
                biased;
                () = loop_token.cancelled() => break,
                control = tick() => control,
            };
            if control == LoopControl::Stop {
                info!(loop_name = %kind, "Loop finished");
                loop_token.cancel();
                break;
            }

            tokio::select! {
                biased;
                () = loop_token.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }

        Metrics::loop_active(kind.as_str(), false);
        debug!(loop_name = %kind, "Loop torn down");
    });

    LoopHandle { kind, token, task }
}

/// Spawn a fixed-rate loop for work that never suspends, like the countdown.
///
/// Missed ticks are skipped rather than replayed.
pub fn spawn_ticker<F>(kind: LoopKind, period: Duration, mut tick: F) -> LoopHandle
where
    F: FnMut() + Send + 'static,
{
    let token = CancellationToken::new();
    let loop_token = token.clone();

    let task = tokio::spawn(async move {
        Metrics::loop_active(kind.as_str(), true);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = loop_token.cancelled() => break,
                _ = ticker.tick() => tick(),
            }
        }

        Metrics::loop_active(kind.as_str(), false);
        debug!(loop_name = %kind, "Ticker torn down");
    });

    LoopHandle { kind, token, task }
}
