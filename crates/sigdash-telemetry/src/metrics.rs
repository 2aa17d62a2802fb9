//! Prometheus metrics for the sigdash client.
//!
//! Covers:
//! - Polling loop outcomes and latency
//! - Engine connectivity
//! - Alert rendering and suppression
//! - Profit threshold crossings
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error caught at first use.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram_vec,
    register_int_gauge, CounterVec, Encoder, Gauge, GaugeVec, HistogramVec, IntGauge,
    TextEncoder,
};

/// Poll attempts per loop.
/// Labels: loop (worker/sidebar/alerts/quotes/optimizer),
/// outcome (ok/error)
pub static POLL_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigdash_poll_total",
        "Total poll attempts per loop",
        &["loop", "outcome"]
    )
    .unwrap()
});

/// Poll latency in milliseconds.
pub static POLL_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "sigdash_poll_latency_ms",
        "Time from poll start until the fetch settled, in milliseconds",
        &["loop"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Whether a loop is currently armed (1) or stopped (0).
pub static LOOP_ACTIVE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "sigdash_loop_active",
        "Polling loop armed state (1=running)",
        &["loop"]
    )
    .unwrap()
});

/// Engine reachability (1 = online).
pub static ENGINE_ONLINE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("sigdash_engine_online", "Engine reachability (1=online)").unwrap()
});

/// Alert outcomes.
/// Labels: kind (PROFIT/PRICE/NEWS/TP/SL/GENERAL), outcome (rendered/suppressed)
pub static ALERTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigdash_alerts_total",
        "Alerts by kind and outcome",
        &["kind", "outcome"]
    )
    .unwrap()
});

/// Alerts currently on screen.
pub static ALERTS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("sigdash_alerts_active", "Alerts currently displayed").unwrap()
});

/// Profit threshold crossings.
pub static PROFIT_CROSSINGS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigdash_profit_crossings_total",
        "Upward crossings of the profit alert threshold",
        &["ticker"]
    )
    .unwrap()
});

/// Quotes that could not be parsed.
pub static QUOTE_PARSE_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigdash_quote_parse_errors_total",
        "Quote payloads with malformed fields",
        &["ticker"]
    )
    .unwrap()
});

/// Worker state reported by the engine.
/// Labels: state (IDLE/RUNNING/PAUSED/ERROR)
pub static WORKER_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "sigdash_worker_state",
        "Remote worker state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a settled poll.
    pub fn poll_settled(loop_name: &str, ok: bool, latency_ms: f64) {
        let outcome = if ok { "ok" } else { "error" };
        POLL_TOTAL.with_label_values(&[loop_name, outcome]).inc();
        POLL_LATENCY_MS
            .with_label_values(&[loop_name])
            .observe(latency_ms);
    }

    /// Record a loop being armed or torn down.
    pub fn loop_active(loop_name: &str, active: bool) {
        LOOP_ACTIVE
            .with_label_values(&[loop_name])
            .set(if active { 1.0 } else { 0.0 });
    }

    /// Update engine reachability.
    pub fn engine_online(online: bool) {
        ENGINE_ONLINE.set(if online { 1.0 } else { 0.0 });
    }

    /// Record a rendered alert.
    pub fn alert_rendered(kind: &str) {
        ALERTS_TOTAL.with_label_values(&[kind, "rendered"]).inc();
        ALERTS_ACTIVE.inc();
    }

    /// Record a snoozed alert.
    pub fn alert_suppressed(kind: &str) {
        ALERTS_TOTAL.with_label_values(&[kind, "suppressed"]).inc();
    }

    /// Record an alert leaving the screen.
    pub fn alert_removed() {
        ALERTS_ACTIVE.dec();
    }

    /// Record an upward profit threshold crossing.
    pub fn profit_crossing(ticker: &str) {
        PROFIT_CROSSINGS_TOTAL.with_label_values(&[ticker]).inc();
    }

    /// Record a malformed quote.
    pub fn quote_parse_error(ticker: &str) {
        QUOTE_PARSE_ERRORS_TOTAL.with_label_values(&[ticker]).inc();
    }

    /// Set worker state. Only the active state is 1.
    pub fn worker_state_set(state: &str) {
        for s in &["IDLE", "RUNNING", "PAUSED", "ERROR"] {
            WORKER_STATE.with_label_values(&[s]).set(0.0);
        }
        WORKER_STATE.with_label_values(&[state]).set(1.0);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_counters() {
        Metrics::poll_settled("test_loop", true, 12.0);
        Metrics::poll_settled("test_loop", false, 30.0);
        assert!(POLL_TOTAL.with_label_values(&["test_loop", "ok"]).get() >= 1.0);
        assert!(POLL_TOTAL.with_label_values(&["test_loop", "error"]).get() >= 1.0);
    }

    #[test]
    fn test_worker_state_is_exclusive() {
        Metrics::worker_state_set("PAUSED");
        assert_eq!(WORKER_STATE.with_label_values(&["PAUSED"]).get(), 1.0);
        assert_eq!(WORKER_STATE.with_label_values(&["RUNNING"]).get(), 0.0);
    }

    #[test]
    fn test_render_contains_registered_metrics() {
        Metrics::engine_online(true);
        let text = Metrics::render().unwrap();
        assert!(text.contains("sigdash_engine_online"));
    }
}
