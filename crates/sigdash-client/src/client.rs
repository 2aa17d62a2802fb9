//! HTTP client for the signal engine REST API.
//!
//! All paths are relative to a configured base URL. Response handling is
//! shared by every endpoint:
//! - transport failure → `Transport`, connectivity marked offline
//! - 204 or empty body → `None`
//! - non-2xx → status-specific error with the server's `detail` if decodable

use crate::api::DashboardApi;
use crate::connectivity::Connectivity;
use crate::error::{ClientError, ClientResult};
use crate::quote::parse_quote;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sigdash_core::{
    AgentReport, BacktestRequest, DiscardedCount, OptimizerReport, PortfolioHolding,
    QuoteSnapshot, SystemAlert, TradeOrder, TradeSide, WorkerCommand, WorkerStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sentinel the alert endpoint returns when there is nothing to show.
pub const NO_ALERT: &str = "NONE";

/// Client for the engine API.
pub struct ApiClient {
    /// HTTP client.
    client: Client,
    /// Base URL without trailing slash.
    base_url: String,
    /// Online/offline indicator fed by every request.
    connectivity: Arc<Connectivity>,
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g., "http://localhost:8000/api")
    /// * `timeout` - per-request transport timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            connectivity: Arc::new(Connectivity::new()),
        })
    }

    /// Shared connectivity indicator.
    pub fn connectivity(&self) -> Arc<Connectivity> {
        self.connectivity.clone()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Option<T>> {
        let request = self.client.get(self.url(path));
        self.execute(path, request).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<Option<T>> {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(path, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> ClientResult<Option<T>> {
        debug!(path, "Engine request");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                self.connectivity.mark_offline();
                return Err(ClientError::Transport(format!("{path}: {e}")));
            }
        };
        self.connectivity.mark_online();

        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) if status.is_success() => {
                return Err(ClientError::Decode {
                    path: path.to_string(),
                    message: e.to_string(),
                });
            }
            // Error status with an unreadable body: fall back to status text.
            Err(_) => return Err(ClientError::from_status(status, None)),
        };

        let result = interpret_response(path, status, &body);
        if let Err(e) = &result {
            warn!(path, status = status.as_u16(), error = %e, "Engine request failed");
        }
        result
    }

    /// Turn an optional body into a required one.
    fn require<T>(path: &str, value: Option<T>) -> ClientResult<T> {
        value.ok_or_else(|| ClientError::EmptyResponse(path.to_string()))
    }
}

/// Interpret a response status and raw body.
///
/// Split out from the transport so the status/body rules can be tested
/// without a server.
pub fn interpret_response<T: DeserializeOwned>(
    path: &str,
    status: StatusCode,
    body: &[u8],
) -> ClientResult<Option<T>> {
    if !status.is_success() {
        return Err(ClientError::from_status(status, extract_detail(body)));
    }

    if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ClientError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
}

/// Pull a human-readable reason out of an error body.
///
/// Understands `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}` (field
/// validation errors), `{"message": "..."}`, and plain text.
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?.trim();
    if text.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        // Plain-text bodies are used as-is, HTML error pages are not.
        return (!text.starts_with('<')).then(|| text.to_string());
    };

    let detail = value.get("detail").or_else(|| value.get("message"))?;
    match detail {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_string)
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl DashboardApi for ApiClient {
    async fn worker_status(&self) -> ClientResult<WorkerStatus> {
        const PATH: &str = "worker/status";
        Self::require(PATH, self.get(PATH).await?)
    }

    async fn worker_control(&self, command: WorkerCommand) -> ClientResult<()> {
        let path = format!("worker/control/{}", command.as_path());
        let _: Option<serde_json::Value> = self.post::<(), _>(&path, None).await?;
        Ok(())
    }

    async fn candidates(&self) -> ClientResult<Vec<serde_json::Value>> {
        Ok(self.get("candidates/phase1").await?.unwrap_or_default())
    }

    async fn results(&self) -> ClientResult<Vec<serde_json::Value>> {
        Ok(self.get("results/phase2").await?.unwrap_or_default())
    }

    async fn signals(&self) -> ClientResult<Vec<serde_json::Value>> {
        Ok(self.get("signals/phase3").await?.unwrap_or_default())
    }

    async fn discarded_count(&self) -> ClientResult<DiscardedCount> {
        const PATH: &str = "signals/discarded-count-24h";
        Self::require(PATH, self.get(PATH).await?)
    }

    async fn system_alert(&self) -> ClientResult<SystemAlert> {
        Ok(self.get("system/alert").await?.unwrap_or(SystemAlert {
            message: NO_ALERT.to_string(),
        }))
    }

    async fn portfolio(&self) -> ClientResult<Vec<PortfolioHolding>> {
        Ok(self.get("portfolio").await?.unwrap_or_default())
    }

    async fn trade(
        &self,
        side: TradeSide,
        order: &TradeOrder,
    ) -> ClientResult<Option<serde_json::Value>> {
        let path = format!("portfolio/{}", side.as_path());
        self.post(&path, Some(order)).await
    }

    async fn quote(&self, ticker: &str) -> ClientResult<QuoteSnapshot> {
        let path = format!("quote/{ticker}");
        let raw: serde_json::Value = Self::require(&path, self.get(&path).await?)?;
        parse_quote(ticker, &raw)
    }

    async fn agent_report(&self, page: u32, page_size: u32) -> ClientResult<AgentReport> {
        let path = format!("virtual-agent/report?page={page}&page_size={page_size}");
        Ok(self.get(&path).await?.unwrap_or_default())
    }

    async fn request_backtest(&self, year: i32) -> ClientResult<Option<serde_json::Value>> {
        self.post("backtest/request", Some(&BacktestRequest { year }))
            .await
    }

    async fn request_optimizer(&self) -> ClientResult<Option<serde_json::Value>> {
        self.post::<(), _>("ai-optimizer/request", None).await
    }

    async fn optimizer_report(&self) -> ClientResult<OptimizerReport> {
        Ok(self.get("ai-optimizer/report").await?.unwrap_or_default())
    }
}
