//! In-memory engine and recording view for tests.

use crate::paginator::ReportPage;
use crate::portfolio::HoldingRow;
use crate::view::{NoticeLevel, OptimizerUpdate, ViewSink};
use crate::worker::WorkerPanelState;
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use sigdash_alerts::{AlertId, AlertRecord, AlertSink};
use sigdash_client::{ClientError, ClientResult, DashboardApi};
use sigdash_core::{
    AgentReport, Countdown, DiscardedCount, OptimizerReport, OptimizerStatus, PortfolioHolding,
    Price, Quantity, QuoteSnapshot, SidebarSummary, SystemAlert, TradeOrder, TradeSide,
    WorkerCommand, WorkerStatus,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

pub fn holding(ticker: &str, quantity: Decimal, average_buy_price: Decimal) -> PortfolioHolding {
    PortfolioHolding {
        ticker: ticker.to_string(),
        quantity: Quantity::new(quantity),
        average_buy_price: Price::new(average_buy_price),
        take_profit: None,
    }
}

pub fn quote(price: Decimal) -> QuoteSnapshot {
    QuoteSnapshot {
        price: Price::new(price),
        change: Decimal::ZERO,
        change_percent: Decimal::ZERO,
        previous_close: Price::new(price),
        as_of: None,
    }
}

/// `ClientError` is not `Clone`; rebuild an equivalent value per call.
fn replay(error: &ClientError) -> ClientError {
    match error {
        ClientError::BadRequest(m) => ClientError::BadRequest(m.clone()),
        ClientError::NotFound(m) => ClientError::NotFound(m.clone()),
        ClientError::Conflict(m) => ClientError::Conflict(m.clone()),
        ClientError::Unprocessable(m) => ClientError::Unprocessable(m.clone()),
        ClientError::Http { status, message } => ClientError::Http {
            status: *status,
            message: message.clone(),
        },
        ClientError::MalformedQuote {
            ticker,
            field,
            value,
        } => ClientError::MalformedQuote {
            ticker: ticker.clone(),
            field: field.clone(),
            value: value.clone(),
        },
        other => ClientError::Transport(other.to_string()),
    }
}

fn offline() -> ClientError {
    ClientError::Transport("connection refused".to_string())
}

/// Scripted engine. Unset endpoints answer with empty defaults.
#[derive(Default)]
pub struct FakeApi {
    offline: AtomicBool,
    calls: Mutex<HashMap<&'static str, usize>>,
    worker: Mutex<Option<WorkerStatus>>,
    controls: Mutex<Vec<WorkerCommand>>,
    sidebar: Mutex<SidebarSummary>,
    alerts: Mutex<VecDeque<String>>,
    portfolio: Mutex<Vec<PortfolioHolding>>,
    quotes: Mutex<HashMap<String, ClientResult<QuoteSnapshot>>>,
    trades: Mutex<Vec<(TradeSide, TradeOrder)>>,
    trade_error: Mutex<Option<ClientError>>,
    report_total: Mutex<u64>,
    report_requests: Mutex<Vec<(u32, u32)>>,
    backtests: Mutex<Vec<i32>>,
    optimizer_script: Mutex<VecDeque<OptimizerReport>>,
    optimizer_requests: Mutex<usize>,
}

impl FakeApi {
    fn enter(&self, endpoint: &'static str) -> ClientResult<()> {
        *self.calls.lock().entry(endpoint).or_default() += 1;
        if self.offline.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(())
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.lock().get(endpoint).copied().unwrap_or(0)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_worker(&self, status: WorkerStatus) {
        *self.worker.lock() = Some(status);
    }

    pub fn controls(&self) -> Vec<WorkerCommand> {
        self.controls.lock().clone()
    }

    pub fn set_sidebar(&self, summary: SidebarSummary) {
        *self.sidebar.lock() = summary;
    }

    /// Queue alert messages; once drained the feed answers `NONE`.
    pub fn push_alert(&self, message: &str) {
        self.alerts.lock().push_back(message.to_string());
    }

    pub fn set_portfolio(&self, holdings: Vec<PortfolioHolding>) {
        *self.portfolio.lock() = holdings;
    }

    pub fn set_quote(&self, ticker: &str, quote: ClientResult<QuoteSnapshot>) {
        self.quotes.lock().insert(ticker.to_string(), quote);
    }

    pub fn trades(&self) -> Vec<(TradeSide, TradeOrder)> {
        self.trades.lock().clone()
    }

    pub fn reject_trades(&self, error: ClientError) {
        *self.trade_error.lock() = Some(error);
    }

    pub fn set_report_total(&self, total: u64) {
        *self.report_total.lock() = total;
    }

    pub fn report_requests(&self) -> Vec<(u32, u32)> {
        self.report_requests.lock().clone()
    }

    pub fn backtests(&self) -> Vec<i32> {
        self.backtests.lock().clone()
    }

    /// Queue optimizer reports; the last one repeats once the queue drains.
    pub fn script_optimizer(&self, statuses: &[OptimizerStatus]) {
        let mut script = self.optimizer_script.lock();
        for status in statuses {
            script.push_back(OptimizerReport {
                status: *status,
                report_text: Some(format!("report {status:?}")),
                last_updated: None,
            });
        }
    }

    pub fn optimizer_requests(&self) -> usize {
        *self.optimizer_requests.lock()
    }
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn worker_status(&self) -> ClientResult<WorkerStatus> {
        self.enter("worker_status")?;
        self.worker
            .lock()
            .clone()
            .ok_or_else(|| ClientError::EmptyResponse("worker/status".to_string()))
    }

    async fn worker_control(&self, command: WorkerCommand) -> ClientResult<()> {
        self.enter("worker_control")?;
        self.controls.lock().push(command);
        Ok(())
    }

    async fn candidates(&self) -> ClientResult<Vec<serde_json::Value>> {
        self.enter("candidates")?;
        Ok(vec![serde_json::Value::Null; self.sidebar.lock().candidates])
    }

    async fn results(&self) -> ClientResult<Vec<serde_json::Value>> {
        self.enter("results")?;
        Ok(vec![serde_json::Value::Null; self.sidebar.lock().results])
    }

    async fn signals(&self) -> ClientResult<Vec<serde_json::Value>> {
        self.enter("signals")?;
        Ok(vec![serde_json::Value::Null; self.sidebar.lock().signals])
    }

    async fn discarded_count(&self) -> ClientResult<DiscardedCount> {
        self.enter("discarded_count")?;
        Ok(DiscardedCount {
            discarded_count_24h: self.sidebar.lock().discarded_24h,
        })
    }

    async fn system_alert(&self) -> ClientResult<SystemAlert> {
        self.enter("system_alert")?;
        let message = self
            .alerts
            .lock()
            .pop_front()
            .unwrap_or_else(|| "NONE".to_string());
        Ok(SystemAlert { message })
    }

    async fn portfolio(&self) -> ClientResult<Vec<PortfolioHolding>> {
        self.enter("portfolio")?;
        Ok(self.portfolio.lock().clone())
    }

    async fn trade(
        &self,
        side: TradeSide,
        order: &TradeOrder,
    ) -> ClientResult<Option<serde_json::Value>> {
        self.enter("trade")?;
        if let Some(error) = self.trade_error.lock().as_ref() {
            return Err(replay(error));
        }
        self.trades.lock().push((side, order.clone()));
        Ok(None)
    }

    async fn quote(&self, ticker: &str) -> ClientResult<QuoteSnapshot> {
        self.enter("quote")?;
        match self.quotes.lock().get(ticker) {
            Some(Ok(quote)) => Ok(quote.clone()),
            Some(Err(error)) => Err(replay(error)),
            None => Err(ClientError::NotFound(format!("quote/{ticker}"))),
        }
    }

    async fn agent_report(&self, page: u32, page_size: u32) -> ClientResult<AgentReport> {
        self.enter("agent_report")?;
        self.report_requests.lock().push((page, page_size));
        let total = *self.report_total.lock();
        let start = u64::from(page.saturating_sub(1)) * u64::from(page_size);
        let rows = total.saturating_sub(start).min(u64::from(page_size));
        Ok(AgentReport {
            stats: serde_json::json!({ "total": total }),
            trades: (0..rows).map(|i| serde_json::json!({ "n": start + i })).collect(),
            total_trades_count: total,
        })
    }

    async fn request_backtest(&self, year: i32) -> ClientResult<Option<serde_json::Value>> {
        self.enter("request_backtest")?;
        self.backtests.lock().push(year);
        Ok(None)
    }

    async fn request_optimizer(&self) -> ClientResult<Option<serde_json::Value>> {
        self.enter("request_optimizer")?;
        *self.optimizer_requests.lock() += 1;
        Ok(None)
    }

    async fn optimizer_report(&self) -> ClientResult<OptimizerReport> {
        self.enter("optimizer_report")?;
        let mut script = self.optimizer_script.lock();
        let report = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        Ok(report.unwrap_or_default())
    }
}

/// View and alert sink that records everything it is shown.
#[derive(Default)]
pub struct RecordingView {
    connectivity: Mutex<Vec<bool>>,
    panels: Mutex<Vec<WorkerPanelState>>,
    sidebars: Mutex<Vec<SidebarSummary>>,
    rows: Mutex<Vec<Vec<HoldingRow>>>,
    countdowns: Mutex<Vec<Countdown>>,
    report_pages: Mutex<Vec<ReportPage>>,
    optimizer: Mutex<Vec<OptimizerUpdate>>,
    controls: Mutex<Vec<bool>>,
    notices: Mutex<Vec<(NoticeLevel, String)>>,
    alerts: Mutex<Vec<AlertRecord>>,
    removed: Mutex<Vec<AlertId>>,
}

impl RecordingView {
    pub fn connectivity(&self) -> Vec<bool> {
        self.connectivity.lock().clone()
    }

    pub fn last_panel(&self) -> Option<WorkerPanelState> {
        self.panels.lock().last().cloned()
    }

    pub fn sidebars(&self) -> Vec<SidebarSummary> {
        self.sidebars.lock().clone()
    }

    pub fn last_rows(&self) -> Option<Vec<HoldingRow>> {
        self.rows.lock().last().cloned()
    }

    pub fn countdown_count(&self) -> usize {
        self.countdowns.lock().len()
    }

    pub fn report_pages(&self) -> Vec<ReportPage> {
        self.report_pages.lock().clone()
    }

    pub fn optimizer_updates(&self) -> Vec<OptimizerUpdate> {
        self.optimizer.lock().clone()
    }

    pub fn controls(&self) -> Vec<bool> {
        self.controls.lock().clone()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().clone()
    }

    pub fn alerts(&self) -> Vec<AlertRecord> {
        self.alerts.lock().clone()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().len()
    }

    pub fn removed(&self) -> Vec<AlertId> {
        self.removed.lock().clone()
    }
}

impl ViewSink for RecordingView {
    fn connectivity(&self, online: bool) {
        self.connectivity.lock().push(online);
    }

    fn worker_panel(&self, panel: &WorkerPanelState) {
        self.panels.lock().push(panel.clone());
    }

    fn sidebar(&self, summary: &SidebarSummary) {
        self.sidebars.lock().push(*summary);
    }

    fn portfolio(&self, rows: &[HoldingRow]) {
        self.rows.lock().push(rows.to_vec());
    }

    fn countdown(&self, countdown: &Countdown) {
        self.countdowns.lock().push(countdown.clone());
    }

    fn report_page(&self, page: &ReportPage) {
        self.report_pages.lock().push(page.clone());
    }

    fn optimizer(&self, update: &OptimizerUpdate) {
        self.optimizer.lock().push(update.clone());
    }

    fn controls_enabled(&self, enabled: bool) {
        self.controls.lock().push(enabled);
    }

    fn notice(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().push((level, message.to_string()));
    }
}

impl AlertSink for RecordingView {
    fn show(&self, record: &AlertRecord) {
        self.alerts.lock().push(record.clone());
    }

    fn remove(&self, id: AlertId) {
        self.removed.lock().push(id);
    }
}
