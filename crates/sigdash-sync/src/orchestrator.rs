//! Polling orchestrator.
//!
//! Owns the loop handles and the shared context. Three loops (worker,
//! sidebar, alerts) run for the whole session; the rest are scoped:
//!
//! | loop      | interval | runs while                              |
//! |-----------|----------|-----------------------------------------|
//! | worker    | 5 s      | started                                 |
//! | sidebar   | 15 s     | started                                 |
//! | alerts    | 7 s      | started                                 |
//! | quotes    | 30 s     | portfolio view mounted and non-empty    |
//! | optimizer | 5 s      | an optimizer job is outstanding         |
//! | countdown | 1 s      | dashboard view mounted                  |

use crate::config::PollingConfig;
use crate::context::DashboardContext;
use crate::error::{SyncError, SyncResult};
use crate::paginator::ReportPaginator;
use crate::portfolio::PortfolioDesk;
use crate::task::{spawn_polling, spawn_ticker, LoopControl, LoopHandle, LoopKind};
use crate::view::{NoticeLevel, OptimizerUpdate, View, ViewSink};
use crate::worker::WorkerPanelState;
use chrono::Utc;
use futures_util::future::try_join4;
use parking_lot::Mutex;
use sigdash_alerts::{AlertDeduplicator, ProfitAlertMonitor};
use sigdash_client::{ClientError, DashboardApi};
use sigdash_core::{
    MarketClock, OptimizerStatus, Price, Quantity, SidebarSummary, WorkerCommand,
};
use sigdash_telemetry::Metrics;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// State shared by every loop task.
struct Shared {
    api: Arc<dyn DashboardApi>,
    ctx: Arc<DashboardContext>,
    view: Arc<dyn ViewSink>,
    dedup: Arc<AlertDeduplicator>,
    desk: PortfolioDesk,
    paginator: ReportPaginator,
    clock: MarketClock,
    config: PollingConfig,
}

impl Shared {
    /// Record a settled request for metrics and the connectivity indicator.
    fn settle<T>(&self, kind: LoopKind, started: Instant, result: &Result<T, ClientError>) {
        let ok = result.is_ok();
        Metrics::poll_settled(
            kind.as_str(),
            ok,
            started.elapsed().as_secs_f64() * 1000.0,
        );

        let reachable = match result {
            Ok(_) => true,
            Err(e) => !e.is_transport(),
        };
        if let Some(online) = self.ctx.record_reachability(reachable) {
            Metrics::engine_online(online);
            self.view.connectivity(online);
        }
    }

    async fn poll_worker(&self) -> LoopControl {
        let started = Instant::now();
        let result = self.api.worker_status().await;
        self.settle(LoopKind::Worker, started, &result);

        match result {
            Ok(status) => {
                let panel = WorkerPanelState::from_status(
                    &status,
                    Utc::now(),
                    self.config.heartbeat_stale_ms,
                    self.ctx.is_mounted(View::Dashboard),
                );
                if panel.heartbeat.is_interrupted() {
                    warn!(status = %status.status, "Worker heartbeat is stale");
                }
                Metrics::worker_state_set(&status.status.to_string());
                self.ctx.set_worker(status, panel.clone());
                self.view.worker_panel(&panel);
            }
            Err(e) => debug!(error = %e, "Worker status poll failed"),
        }
        LoopControl::Continue
    }

    async fn poll_sidebar(&self) -> LoopControl {
        let started = Instant::now();
        let result = try_join4(
            self.api.candidates(),
            self.api.results(),
            self.api.signals(),
            self.api.discarded_count(),
        )
        .await;
        self.settle(LoopKind::Sidebar, started, &result);

        match result {
            Ok((candidates, results, signals, discarded)) => {
                let summary = SidebarSummary {
                    candidates: candidates.len(),
                    results: results.len(),
                    signals: signals.len(),
                    discarded_24h: discarded.discarded_count_24h,
                };
                self.ctx.set_sidebar(summary);
                self.view.sidebar(&summary);
            }
            Err(e) => debug!(error = %e, "Sidebar poll failed"),
        }
        LoopControl::Continue
    }

    async fn poll_alerts(&self) -> LoopControl {
        let started = Instant::now();
        let result = self.api.system_alert().await;
        self.settle(LoopKind::Alerts, started, &result);

        match result {
            Ok(alert) => {
                self.dedup.present(&alert.message);
            }
            Err(e) => debug!(error = %e, "System alert poll failed"),
        }
        LoopControl::Continue
    }

    async fn poll_quotes(&self) -> LoopControl {
        if !self.ctx.is_mounted(View::Portfolio) || !self.ctx.has_holdings() {
            return LoopControl::Stop;
        }
        let started = Instant::now();
        let refreshed = self.desk.refresh_quotes().await;
        Metrics::poll_settled(
            LoopKind::Quotes.as_str(),
            refreshed > 0,
            started.elapsed().as_secs_f64() * 1000.0,
        );
        LoopControl::Continue
    }

    async fn poll_optimizer(&self) -> LoopControl {
        let started = Instant::now();
        let result = self.api.optimizer_report().await;
        self.settle(LoopKind::Optimizer, started, &result);

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Optimizer report poll failed, retrying");
                return LoopControl::Continue;
            }
        };

        match report.status {
            OptimizerStatus::Processing => {
                self.view.optimizer(&OptimizerUpdate::Processing);
                LoopControl::Continue
            }
            OptimizerStatus::Done => {
                info!(last_updated = ?report.last_updated, "Optimizer job finished");
                self.ctx.finish_optimizer_job(OptimizerStatus::Done);
                self.view.optimizer(&OptimizerUpdate::Done(report));
                self.view.controls_enabled(true);
                LoopControl::Stop
            }
            status @ (OptimizerStatus::Error | OptimizerStatus::None) => {
                let message = report
                    .report_text
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| match status {
                        OptimizerStatus::Error => "Optimizer job failed".to_string(),
                        _ => "No optimizer job found".to_string(),
                    });
                warn!(status = ?status, message = %message, "Optimizer job ended without a report");
                self.ctx.finish_optimizer_job(status);
                self.view.optimizer(&OptimizerUpdate::Failed(message));
                self.view.controls_enabled(true);
                LoopControl::Stop
            }
        }
    }

    fn tick_countdown(&self) {
        self.view.countdown(&self.clock.countdown());
    }
}

/// Runs the dashboard's polling loops against one engine.
pub struct PollingOrchestrator {
    shared: Arc<Shared>,
    handles: Mutex<HashMap<LoopKind, LoopHandle>>,
}

impl PollingOrchestrator {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        ctx: Arc<DashboardContext>,
        view: Arc<dyn ViewSink>,
        dedup: Arc<AlertDeduplicator>,
        clock: MarketClock,
        config: PollingConfig,
        report_page_size: u32,
    ) -> Self {
        let profit = Arc::new(ProfitAlertMonitor::new(Arc::clone(&dedup)));
        let desk = PortfolioDesk::new(
            Arc::clone(&api),
            Arc::clone(&ctx),
            Arc::clone(&view),
            profit,
        );
        let paginator = ReportPaginator::new(Arc::clone(&api), Arc::clone(&view), report_page_size);

        Self {
            shared: Arc::new(Shared {
                api,
                ctx,
                view,
                dedup,
                desk,
                paginator,
                clock,
                config,
            }),
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &Arc<DashboardContext> {
        &self.shared.ctx
    }

    pub fn dedup(&self) -> &Arc<AlertDeduplicator> {
        &self.shared.dedup
    }

    pub fn portfolio(&self) -> &PortfolioDesk {
        &self.shared.desk
    }

    pub fn report(&self) -> &ReportPaginator {
        &self.shared.paginator
    }

    // === Loop lifecycle ===

    /// Arm the session-wide loops.
    pub fn start(&self) {
        info!("Starting polling loops");
        for kind in [LoopKind::Worker, LoopKind::Sidebar, LoopKind::Alerts] {
            self.arm(kind);
        }
    }

    /// Arm `kind`, replacing any previous handle for it.
    fn arm(&self, kind: LoopKind) {
        let shared = Arc::clone(&self.shared);
        let config = &self.shared.config;
        let handle = match kind {
            LoopKind::Worker => spawn_polling(kind, config.worker_interval(), move || {
                let shared = Arc::clone(&shared);
                async move { shared.poll_worker().await }
            }),
            LoopKind::Sidebar => spawn_polling(kind, config.sidebar_interval(), move || {
                let shared = Arc::clone(&shared);
                async move { shared.poll_sidebar().await }
            }),
            LoopKind::Alerts => spawn_polling(kind, config.alerts_interval(), move || {
                let shared = Arc::clone(&shared);
                async move { shared.poll_alerts().await }
            }),
            LoopKind::Quotes => spawn_polling(kind, config.quotes_interval(), move || {
                let shared = Arc::clone(&shared);
                async move { shared.poll_quotes().await }
            }),
            LoopKind::Optimizer => spawn_polling(kind, config.optimizer_interval(), move || {
                let shared = Arc::clone(&shared);
                async move { shared.poll_optimizer().await }
            }),
            LoopKind::Countdown => spawn_ticker(kind, config.countdown_interval(), move || {
                shared.tick_countdown()
            }),
        };

        if let Some(previous) = self.handles.lock().insert(kind, handle) {
            previous.cancel();
        }
    }

    /// Cancel one loop. Returns false if it was not running.
    pub fn stop(&self, kind: LoopKind) -> bool {
        match self.handles.lock().remove(&kind) {
            Some(handle) => {
                let was_active = handle.is_active();
                handle.cancel();
                debug!(loop_name = %kind, "Loop stopped");
                was_active
            }
            None => false,
        }
    }

    /// Cancel every outstanding loop.
    pub fn stop_all(&self) {
        let handles: Vec<LoopHandle> = self.handles.lock().drain().map(|(_, h)| h).collect();
        for handle in &handles {
            handle.cancel();
        }
        info!(loops = handles.len(), "All polling loops stopped");
    }

    pub fn is_running(&self, kind: LoopKind) -> bool {
        self.handles
            .lock()
            .get(&kind)
            .is_some_and(|handle| handle.is_active())
    }

    pub fn running_loops(&self) -> Vec<LoopKind> {
        LoopKind::ALL
            .into_iter()
            .filter(|kind| self.is_running(*kind))
            .collect()
    }

    // === Views ===

    /// Mount `view`, tearing down the previous view's loops first.
    pub async fn enter_view(&self, view: View) -> SyncResult<()> {
        self.leave_view();
        self.shared.ctx.set_view(Some(view));
        info!(view = %view, "Entering view");

        match view {
            View::Dashboard => {
                self.shared.tick_countdown();
                self.arm(LoopKind::Countdown);
            }
            View::Portfolio => {
                let count = self.shared.desk.reload().await?;
                // The view may have been left while the portfolio was loading.
                if count > 0 && self.shared.ctx.is_mounted(View::Portfolio) {
                    self.arm(LoopKind::Quotes);
                }
            }
            View::Report => {
                self.shared.paginator.enter().await?;
            }
            View::Optimizer => {
                let report = self.shared.api.optimizer_report().await?;
                self.shared
                    .view
                    .optimizer(&OptimizerUpdate::Snapshot(report));
            }
        }
        Ok(())
    }

    /// Unmount the current view and cancel its scoped loops.
    pub fn leave_view(&self) -> Option<View> {
        let previous = self.shared.ctx.set_view(None);
        match previous {
            Some(View::Dashboard) => {
                self.stop(LoopKind::Countdown);
            }
            Some(View::Portfolio) => {
                self.stop(LoopKind::Quotes);
            }
            _ => {}
        }
        if let Some(view) = previous {
            debug!(view = %view, "Left view");
        }
        previous
    }

    // === Actions ===

    /// Send a worker command if its control is currently enabled.
    pub async fn worker_command(&self, command: WorkerCommand) -> SyncResult<()> {
        let panel = self.shared.ctx.panel();
        if !panel.allows(command) {
            return Err(SyncError::ControlDisabled {
                command,
                state: panel.status_label(),
            });
        }

        match self.shared.api.worker_control(command).await {
            Ok(()) => {
                info!(command = %command, "Worker command accepted");
                self.shared.poll_worker().await;
                Ok(())
            }
            Err(e) => {
                warn!(command = %command, error = %e, "Worker command rejected");
                self.shared.view.notice(NoticeLevel::Error, &e.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn buy(&self, ticker: &str, quantity: Quantity, price: Price) -> SyncResult<()> {
        self.shared.desk.buy(ticker, quantity, price).await?;
        self.rearm_quotes();
        Ok(())
    }

    pub async fn sell(&self, ticker: &str, quantity: Quantity, price: Price) -> SyncResult<()> {
        self.shared.desk.sell(ticker, quantity, price).await?;
        self.rearm_quotes();
        Ok(())
    }

    /// After a reload the quote loop follows the new portfolio.
    fn rearm_quotes(&self) {
        if !self.shared.ctx.is_mounted(View::Portfolio) {
            return;
        }
        if self.shared.ctx.has_holdings() {
            self.arm(LoopKind::Quotes);
        } else {
            self.stop(LoopKind::Quotes);
        }
    }

    pub async fn request_backtest(&self, year: i32) -> SyncResult<()> {
        match self.shared.api.request_backtest(year).await {
            Ok(_) => {
                info!(year, "Backtest requested");
                self.shared
                    .view
                    .notice(NoticeLevel::Info, &format!("Backtest for {year} queued"));
                Ok(())
            }
            Err(e) => {
                self.shared.view.notice(NoticeLevel::Error, &e.to_string());
                Err(e.into())
            }
        }
    }

    /// Start an optimizer job and poll until it finishes.
    ///
    /// Job controls stay disabled until the optimizer loop sees a terminal
    /// status.
    pub async fn request_optimizer(&self) -> SyncResult<()> {
        if !self.shared.ctx.begin_optimizer_job() {
            return Err(SyncError::JobInProgress);
        }
        self.shared.view.controls_enabled(false);

        match self.shared.api.request_optimizer().await {
            Ok(_) => {
                info!("Optimizer job requested");
                self.shared.view.optimizer(&OptimizerUpdate::Processing);
                self.arm(LoopKind::Optimizer);
                Ok(())
            }
            Err(e) => {
                self.shared.ctx.finish_optimizer_job(OptimizerStatus::Error);
                self.shared.view.controls_enabled(true);
                self.shared.view.notice(NoticeLevel::Error, &e.to_string());
                Err(e.into())
            }
        }
    }

    /// Cancel everything and wait for the tasks to exit.
    pub async fn shutdown(&self, grace: Duration) {
        let handles: Vec<LoopHandle> = self.handles.lock().drain().map(|(_, h)| h).collect();
        for handle in handles {
            let kind = handle.kind();
            if tokio::time::timeout(grace, handle.shutdown()).await.is_err() {
                warn!(loop_name = %kind, "Loop did not exit within grace period");
            }
        }
        info!("Polling orchestrator shut down");
    }
}

impl Drop for PollingOrchestrator {
    fn drop(&mut self) {
        for handle in self.handles.get_mut().values() {
            handle.cancel();
        }
    }
}
