//! Main application wiring.
//!
//! Builds the HTTP client, context, sinks and orchestrator from config, runs
//! the session loops until Ctrl-C, then tears every loop down.

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::sink::TracingView;
use sigdash_alerts::AlertDeduplicator;
use sigdash_client::{ApiClient, DashboardApi};
use sigdash_core::MarketClock;
use sigdash_sync::{DashboardContext, PollingOrchestrator, View};
use sigdash_telemetry::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long shutdown waits for each loop task to exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub struct Application {
    orchestrator: PollingOrchestrator,
    initial_view: View,
}

impl Application {
    pub fn new(config: AppConfig, initial_view: View) -> AppResult<Self> {
        let client = ApiClient::new(config.api.base_url.clone(), config.api.timeout())?;
        info!(
            base_url = %client.base_url(),
            timeout_ms = config.api.timeout_ms,
            "API client ready"
        );
        let ctx = Arc::new(DashboardContext::with_connectivity(client.connectivity()));
        Ok(Self::with_api(config, Arc::new(client), ctx, initial_view))
    }

    /// Wire the application around an arbitrary engine implementation.
    pub fn with_api(
        config: AppConfig,
        api: Arc<dyn DashboardApi>,
        ctx: Arc<DashboardContext>,
        initial_view: View,
    ) -> Self {
        let clock = MarketClock::new(config.clock.timezone.clone());
        if !clock.is_exchange_zone() {
            warn!(timezone = %config.clock.timezone, "Countdown will use local time");
        }

        let sink = Arc::new(TracingView::new());
        let dedup = Arc::new(AlertDeduplicator::new(config.alerts.clone(), sink.clone()));
        let orchestrator = PollingOrchestrator::new(
            api,
            ctx,
            sink,
            dedup,
            clock,
            config.polling_config(),
            config.report.page_size,
        );

        Self {
            orchestrator,
            initial_view,
        }
    }

    pub fn orchestrator(&self) -> &PollingOrchestrator {
        &self.orchestrator
    }

    /// Start every session loop and mount the initial view.
    ///
    /// A failing initial view fetch is logged; its loops re-arm on the next
    /// view entry.
    pub async fn start(&self) {
        self.orchestrator.start();
        if let Err(e) = self.orchestrator.enter_view(self.initial_view).await {
            warn!(view = %self.initial_view, error = %e, "Initial view failed to load");
        }
    }

    /// Run until Ctrl-C.
    pub async fn run(&self) -> AppResult<()> {
        self.start().await;
        info!(view = %self.initial_view, "Dashboard running, press Ctrl-C to exit");

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
        self.shutdown().await;
        Ok(())
    }

    /// Unmount the view, then cancel and join every loop.
    pub async fn shutdown(&self) {
        self.orchestrator.leave_view();
        self.orchestrator.shutdown(SHUTDOWN_GRACE).await;

        match Metrics::render() {
            Ok(text) => debug!(bytes = text.len(), "Final metrics snapshot\n{text}"),
            Err(e) => warn!(error = %e, "Failed to render metrics"),
        }
    }
}
