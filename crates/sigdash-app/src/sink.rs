//! Log-backed view and alert sinks.
//!
//! The terminal front end renders by logging: every state change the
//! dashboard would draw becomes a structured `tracing` event.

use parking_lot::Mutex;
use sigdash_alerts::{AlertId, AlertRecord, AlertSink};
use sigdash_core::{Countdown, SidebarSummary};
use sigdash_sync::{
    HoldingRow, NoticeLevel, OptimizerUpdate, ReportPage, Valuation, ViewSink, WorkerPanelState,
};
use tracing::{debug, error, info, trace, warn};

#[derive(Default)]
pub struct TracingView {
    /// Last panel logged at info level; repeats go to debug.
    last_panel: Mutex<Option<WorkerPanelState>>,
}

impl TracingView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewSink for TracingView {
    fn connectivity(&self, online: bool) {
        if online {
            info!("Engine online");
        } else {
            warn!("Engine offline");
        }
    }

    fn worker_panel(&self, panel: &WorkerPanelState) {
        let mut last = self.last_panel.lock();
        let changed = last.as_ref().map_or(true, |prev| {
            prev.status != panel.status
                || prev.phase != panel.phase
                || prev.heartbeat.is_interrupted() != panel.heartbeat.is_interrupted()
        });
        if changed {
            info!(
                status = %panel.status_label(),
                start = panel.start_enabled,
                pause = panel.pause_enabled,
                resume = panel.resume_enabled,
                "Worker"
            );
        }
        if let Some(progress) = panel.progress {
            debug!(
                processed = progress.processed,
                total = progress.total,
                percent = progress.percent(),
                log = panel.log.as_deref().unwrap_or(""),
                "Worker progress"
            );
        }
        *last = Some(panel.clone());
    }

    fn sidebar(&self, summary: &SidebarSummary) {
        info!(
            candidates = summary.candidates,
            results = summary.results,
            signals = summary.signals,
            discarded_24h = summary.discarded_24h,
            "Sidebar"
        );
    }

    fn portfolio(&self, rows: &[HoldingRow]) {
        for row in rows {
            match &row.valuation {
                Valuation::Priced {
                    price,
                    pnl,
                    pnl_pct,
                    take_profit_distance_pct,
                    ..
                } => info!(
                    ticker = %row.ticker,
                    quantity = %row.quantity,
                    avg = %row.average_buy_price,
                    price = %price,
                    market_value = %row.market_value_text(),
                    pnl = %pnl.round_dp(2),
                    pnl_pct = %pnl_pct,
                    tp_distance_pct = ?take_profit_distance_pct,
                    "Holding"
                ),
                Valuation::Pending => info!(
                    ticker = %row.ticker,
                    quantity = %row.quantity,
                    avg = %row.average_buy_price,
                    "Holding (awaiting quote)"
                ),
                Valuation::ParseError { reason } => warn!(
                    ticker = %row.ticker,
                    reason = %reason,
                    "Holding: {}",
                    row.market_value_text()
                ),
            }
        }
    }

    fn countdown(&self, countdown: &Countdown) {
        trace!(session = ?countdown.session, "{}", countdown);
    }

    fn report_page(&self, page: &ReportPage) {
        info!(
            page = page.page,
            page_count = page.page_count,
            trades = page.report.trades.len(),
            total = page.report.total_trades_count,
            prev = page.prev_enabled,
            next = page.next_enabled,
            "Agent report"
        );
    }

    fn optimizer(&self, update: &OptimizerUpdate) {
        match update {
            OptimizerUpdate::Processing => info!("Optimizer running"),
            OptimizerUpdate::Done(report) | OptimizerUpdate::Snapshot(report) => info!(
                status = ?report.status,
                last_updated = ?report.last_updated,
                report = report.report_text.as_deref().unwrap_or(""),
                "Optimizer report"
            ),
            OptimizerUpdate::Failed(message) => warn!(message = %message, "Optimizer job failed"),
        }
    }

    fn controls_enabled(&self, enabled: bool) {
        debug!(enabled, "Job controls");
    }

    fn notice(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Error => error!("{message}"),
            NoticeLevel::Success | NoticeLevel::Info => info!("{message}"),
        }
    }
}

impl AlertSink for TracingView {
    fn show(&self, record: &AlertRecord) {
        warn!(
            id = %record.id,
            key = %record.key,
            style = %record.style,
            "ALERT {}",
            record.message
        );
    }

    fn remove(&self, id: AlertId) {
        debug!(id = %id, "Alert removed");
    }
}
