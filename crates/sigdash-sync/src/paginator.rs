//! Server-paginated agent report.

use crate::error::{SyncError, SyncResult};
use crate::view::ViewSink;
use parking_lot::Mutex;
use serde::Serialize;
use sigdash_client::DashboardApi;
use sigdash_core::AgentReport;
use std::sync::Arc;
use tracing::debug;

/// `ceil(total / page_size)`.
pub fn page_count(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size)) as u32
}

/// A fetched report page with its navigation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPage {
    pub page: u32,
    pub page_count: u32,
    pub page_size: u32,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub report: AgentReport,
}

#[derive(Debug, Clone, Copy)]
struct PageState {
    current: u32,
    page_count: Option<u32>,
}

/// Tracks the current page and re-fetches on every navigation.
pub struct ReportPaginator {
    api: Arc<dyn DashboardApi>,
    view: Arc<dyn ViewSink>,
    page_size: u32,
    state: Mutex<PageState>,
}

impl ReportPaginator {
    pub fn new(api: Arc<dyn DashboardApi>, view: Arc<dyn ViewSink>, page_size: u32) -> Self {
        Self {
            api,
            view,
            page_size,
            state: Mutex::new(PageState {
                current: 1,
                page_count: None,
            }),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn current_page(&self) -> u32 {
        self.state.lock().current
    }

    /// Page count from the last fetch, `None` before the first one.
    pub fn page_count(&self) -> Option<u32> {
        self.state.lock().page_count
    }

    /// Entering the report view always starts from page 1.
    pub async fn enter(&self) -> SyncResult<ReportPage> {
        self.state.lock().current = 1;
        self.go_to(1).await
    }

    /// Fetch `page` and show it. Always hits the server, even for the
    /// current page.
    pub async fn go_to(&self, page: u32) -> SyncResult<ReportPage> {
        let known = self.state.lock().page_count;
        let upper = known.map(|count| count.max(1));
        if page == 0 || upper.is_some_and(|upper| page > upper) {
            return Err(SyncError::PageOutOfRange {
                page,
                page_count: known.unwrap_or(0),
            });
        }

        let report = self.api.agent_report(page, self.page_size).await?;
        let count = page_count(report.total_trades_count, self.page_size);
        {
            let mut state = self.state.lock();
            state.current = page;
            state.page_count = Some(count);
        }
        debug!(page, page_count = count, trades = report.trades.len(), "Report page loaded");

        let page = ReportPage {
            page,
            page_count: count,
            page_size: self.page_size,
            prev_enabled: page > 1,
            next_enabled: page < count,
            report,
        };
        self.view.report_page(&page);
        Ok(page)
    }

    pub async fn next(&self) -> SyncResult<ReportPage> {
        let PageState {
            current,
            page_count,
        } = *self.state.lock();
        let count = page_count.unwrap_or(0);
        if current >= count {
            return Err(SyncError::PageOutOfRange {
                page: current + 1,
                page_count: count,
            });
        }
        self.go_to(current + 1).await
    }

    pub async fn prev(&self) -> SyncResult<ReportPage> {
        let PageState {
            current,
            page_count,
        } = *self.state.lock();
        if current <= 1 {
            return Err(SyncError::PageOutOfRange {
                page: 0,
                page_count: page_count.unwrap_or(0),
            });
        }
        self.go_to(current - 1).await
    }
}
