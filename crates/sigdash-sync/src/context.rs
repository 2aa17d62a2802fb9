//! Shared dashboard state.
//!
//! One `DashboardContext` is owned by the orchestrator and handed to every
//! loop. Locks are only taken for short copy-in/copy-out sections and never
//! held across a request.

use crate::view::View;
use crate::worker::WorkerPanelState;
use dashmap::DashMap;
use parking_lot::RwLock;
use sigdash_client::Connectivity;
use sigdash_core::{
    OptimizerStatus, PortfolioHolding, Price, QuoteSnapshot, Quantity, SidebarSummary,
    WorkerStatus,
};
use std::sync::Arc;

/// Cached quote for one held ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteCell {
    Ready(QuoteSnapshot),
    /// The last response for this ticker could not be parsed.
    ParseError(String),
}

impl QuoteCell {
    pub fn price(&self) -> Option<Price> {
        match self {
            Self::Ready(quote) => Some(quote.price),
            Self::ParseError(_) => None,
        }
    }
}

/// Optimizer job bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerState {
    pub last_status: OptimizerStatus,
    /// Job-triggering controls. Disabled while a job is outstanding.
    pub controls_enabled: bool,
}

impl Default for OptimizerState {
    fn default() -> Self {
        Self {
            last_status: OptimizerStatus::None,
            controls_enabled: true,
        }
    }
}

pub struct DashboardContext {
    connectivity: Arc<Connectivity>,
    /// Last connectivity value pushed to the view.
    shown_online: RwLock<Option<bool>>,
    worker: RwLock<Option<WorkerStatus>>,
    panel: RwLock<WorkerPanelState>,
    sidebar: RwLock<SidebarSummary>,
    portfolio: RwLock<Vec<PortfolioHolding>>,
    quotes: DashMap<String, QuoteCell>,
    view: RwLock<Option<View>>,
    optimizer: RwLock<OptimizerState>,
}

impl DashboardContext {
    pub fn new() -> Self {
        Self::with_connectivity(Arc::new(Connectivity::new()))
    }

    /// Share the connectivity indicator maintained by the HTTP client.
    pub fn with_connectivity(connectivity: Arc<Connectivity>) -> Self {
        Self {
            connectivity,
            shown_online: RwLock::new(None),
            worker: RwLock::new(None),
            panel: RwLock::new(WorkerPanelState::default()),
            sidebar: RwLock::new(SidebarSummary::default()),
            portfolio: RwLock::new(Vec::new()),
            quotes: DashMap::new(),
            view: RwLock::new(None),
            optimizer: RwLock::new(OptimizerState::default()),
        }
    }

    // === Connectivity ===

    /// Record whether the engine answered. Returns the new indicator value
    /// when it differs from what the view last showed.
    pub fn record_reachability(&self, reachable: bool) -> Option<bool> {
        if reachable {
            self.connectivity.mark_online();
        } else {
            self.connectivity.mark_offline();
        }
        let online = self.connectivity.is_online();
        let mut shown = self.shown_online.write();
        if *shown == Some(online) {
            return None;
        }
        *shown = Some(online);
        Some(online)
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    // === Worker ===

    pub fn set_worker(&self, status: WorkerStatus, panel: WorkerPanelState) {
        *self.worker.write() = Some(status);
        *self.panel.write() = panel;
    }

    pub fn worker(&self) -> Option<WorkerStatus> {
        self.worker.read().clone()
    }

    pub fn panel(&self) -> WorkerPanelState {
        self.panel.read().clone()
    }

    // === Sidebar ===

    pub fn set_sidebar(&self, summary: SidebarSummary) {
        *self.sidebar.write() = summary;
    }

    pub fn sidebar(&self) -> SidebarSummary {
        *self.sidebar.read()
    }

    // === Portfolio and quotes ===

    /// Replace the portfolio snapshot and drop every cached quote.
    pub fn replace_portfolio(&self, holdings: Vec<PortfolioHolding>) {
        *self.portfolio.write() = holdings;
        self.quotes.clear();
    }

    pub fn portfolio(&self) -> Vec<PortfolioHolding> {
        self.portfolio.read().clone()
    }

    pub fn has_holdings(&self) -> bool {
        !self.portfolio.read().is_empty()
    }

    pub fn tickers(&self) -> Vec<String> {
        self.portfolio
            .read()
            .iter()
            .map(|h| h.ticker.clone())
            .collect()
    }

    /// Held quantity of `ticker`, zero when not held.
    pub fn held_quantity(&self, ticker: &str) -> Quantity {
        self.portfolio
            .read()
            .iter()
            .find(|h| h.ticker.eq_ignore_ascii_case(ticker))
            .map(|h| h.quantity)
            .unwrap_or_else(|| Quantity::new(rust_decimal::Decimal::ZERO))
    }

    pub fn set_quote(&self, ticker: &str, cell: QuoteCell) {
        self.quotes.insert(ticker.to_string(), cell);
    }

    pub fn quote(&self, ticker: &str) -> Option<QuoteCell> {
        self.quotes.get(ticker).map(|entry| entry.value().clone())
    }

    pub fn price_of(&self, ticker: &str) -> Option<Price> {
        self.quotes.get(ticker).and_then(|entry| entry.price())
    }

    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    // === View ===

    pub fn set_view(&self, view: Option<View>) -> Option<View> {
        std::mem::replace(&mut *self.view.write(), view)
    }

    pub fn view(&self) -> Option<View> {
        *self.view.read()
    }

    pub fn is_mounted(&self, view: View) -> bool {
        self.view() == Some(view)
    }

    // === Optimizer ===

    pub fn optimizer(&self) -> OptimizerState {
        *self.optimizer.read()
    }

    /// Mark a job as outstanding. Returns false if one already is.
    pub fn begin_optimizer_job(&self) -> bool {
        let mut state = self.optimizer.write();
        if !state.controls_enabled {
            return false;
        }
        state.controls_enabled = false;
        state.last_status = OptimizerStatus::Processing;
        true
    }

    pub fn finish_optimizer_job(&self, status: OptimizerStatus) {
        let mut state = self.optimizer.write();
        state.last_status = status;
        state.controls_enabled = true;
    }
}

impl Default for DashboardContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holding(ticker: &str, qty: rust_decimal::Decimal) -> PortfolioHolding {
        PortfolioHolding {
            ticker: ticker.to_string(),
            quantity: Quantity::new(qty),
            average_buy_price: Price::new(dec!(100)),
            take_profit: None,
        }
    }

    fn quote(price: rust_decimal::Decimal) -> QuoteSnapshot {
        QuoteSnapshot {
            price: Price::new(price),
            change: dec!(0),
            change_percent: dec!(0),
            previous_close: Price::new(price),
            as_of: None,
        }
    }

    #[test]
    fn test_portfolio_reload_clears_quotes() {
        let ctx = DashboardContext::new();
        ctx.replace_portfolio(vec![holding("AAPL", dec!(5))]);
        ctx.set_quote("AAPL", QuoteCell::Ready(quote(dec!(190))));
        assert_eq!(ctx.price_of("AAPL"), Some(Price::new(dec!(190))));

        ctx.replace_portfolio(vec![holding("MSFT", dec!(1))]);
        assert_eq!(ctx.quote_count(), 0);
        assert_eq!(ctx.tickers(), vec!["MSFT".to_string()]);
    }

    #[test]
    fn test_parse_error_has_no_price() {
        let ctx = DashboardContext::new();
        ctx.set_quote("AAPL", QuoteCell::ParseError("price: n/a".to_string()));
        assert!(ctx.quote("AAPL").is_some());
        assert!(ctx.price_of("AAPL").is_none());
    }

    #[test]
    fn test_held_quantity() {
        let ctx = DashboardContext::new();
        ctx.replace_portfolio(vec![holding("AAPL", dec!(5))]);
        assert_eq!(ctx.held_quantity("aapl"), Quantity::new(dec!(5)));
        assert_eq!(ctx.held_quantity("TSLA"), Quantity::new(dec!(0)));
    }

    #[test]
    fn test_reachability_reports_only_changes() {
        let ctx = DashboardContext::new();
        assert_eq!(ctx.record_reachability(true), Some(true));
        assert_eq!(ctx.record_reachability(true), None);
        assert_eq!(ctx.record_reachability(false), Some(false));
        assert_eq!(ctx.record_reachability(false), None);
        assert!(!ctx.is_online());
        assert_eq!(ctx.record_reachability(true), Some(true));
    }

    #[test]
    fn test_optimizer_job_gate() {
        let ctx = DashboardContext::new();
        assert!(ctx.begin_optimizer_job());
        assert!(!ctx.begin_optimizer_job());
        assert!(!ctx.optimizer().controls_enabled);

        ctx.finish_optimizer_job(OptimizerStatus::Done);
        assert!(ctx.optimizer().controls_enabled);
        assert_eq!(ctx.optimizer().last_status, OptimizerStatus::Done);
    }
}
