//! Alert deduplication with user snooze.
//!
//! Every message is reduced to an [`AlertKey`]. A key that the user dismissed
//! stays silent until its snooze expiry; everything else is rendered as a
//! transient [`AlertRecord`] that removes itself after the auto-dismiss delay.
//!
//! Both removal paths go through the active table, so removing an alert that
//! is already gone is a no-op rather than a second sink call.

use crate::classify::{classify_key, classify_style, AlertKey, AlertStyle};
use crate::config::AlertConfig;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sigdash_telemetry::Metrics;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sentinel the engine returns when no system alert is pending.
pub const NO_ALERT_SENTINEL: &str = "NONE";

/// Identifier of a rendered alert element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(Uuid);

impl AlertId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An alert currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRecord {
    pub id: AlertId,
    pub key: AlertKey,
    pub message: String,
    pub style: AlertStyle,
    pub rendered_at: DateTime<Utc>,
    pub auto_dismiss_at: DateTime<Utc>,
}

/// Where rendered alerts go.
///
/// `show` receives every rendered record; `remove` is called at most once per
/// id, by whichever dismissal path gets there first.
#[cfg_attr(test, mockall::automock)]
pub trait AlertSink: Send + Sync {
    fn show(&self, record: &AlertRecord);
    fn remove(&self, id: AlertId);
}

/// Result of presenting a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentOutcome {
    /// Empty message or the no-alert sentinel.
    Ignored,
    /// Key is snoozed until `until`.
    Suppressed {
        key: AlertKey,
        until: DateTime<Utc>,
    },
    Rendered(AlertRecord),
}

impl PresentOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

#[derive(Default)]
struct DedupState {
    /// key -> snooze expiry. Expired entries are ignored, never evicted.
    snoozed: HashMap<AlertKey, DateTime<Utc>>,
    active: HashMap<AlertId, AlertRecord>,
}

/// Classifies, suppresses and renders alert messages.
pub struct AlertDeduplicator {
    config: AlertConfig,
    sink: Arc<dyn AlertSink>,
    state: Mutex<DedupState>,
}

impl AlertDeduplicator {
    pub fn new(config: AlertConfig, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            config,
            sink,
            state: Mutex::new(DedupState::default()),
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Present a message now and schedule its auto-dismissal.
    pub fn present(self: &Arc<Self>, raw: &str) -> PresentOutcome {
        let outcome = self.present_at(raw, Utc::now());
        if let PresentOutcome::Rendered(record) = &outcome {
            self.schedule_auto_dismiss(record.id);
        }
        outcome
    }

    /// Present a message at `now` without scheduling anything.
    ///
    /// Callers that drive time themselves pair this with [`expire_due`].
    ///
    /// [`expire_due`]: Self::expire_due
    pub fn present_at(&self, raw: &str, now: DateTime<Utc>) -> PresentOutcome {
        let message = raw.trim();
        if message.is_empty() || message == NO_ALERT_SENTINEL {
            return PresentOutcome::Ignored;
        }

        let key = classify_key(message);
        let record = {
            let mut state = self.state.lock();
            if let Some(until) = state.snoozed.get(&key).copied() {
                if now < until {
                    debug!(key = %key, until = %until, "Alert suppressed by snooze");
                    Metrics::alert_suppressed(key.kind_label());
                    return PresentOutcome::Suppressed { key, until };
                }
            }

            let auto_dismiss = chrono::Duration::milliseconds(self.config.auto_dismiss_ms as i64);
            let record = AlertRecord {
                id: AlertId::new(),
                key,
                message: message.to_string(),
                style: classify_style(message),
                rendered_at: now,
                auto_dismiss_at: now + auto_dismiss,
            };
            state.active.insert(record.id, record.clone());
            record
        };

        info!(
            id = %record.id,
            key = %record.key,
            style = record.style.as_str(),
            message = %record.message,
            "Alert rendered"
        );
        Metrics::alert_rendered(record.key.kind_label());
        self.sink.show(&record);
        PresentOutcome::Rendered(record)
    }

    fn schedule_auto_dismiss(self: &Arc<Self>, id: AlertId) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let this = Arc::clone(self);
                let delay = self.config.auto_dismiss();
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    this.dismiss_auto(id);
                });
            }
            Err(_) => {
                warn!(id = %id, "No runtime for auto-dismiss; alert stays until expire_due");
            }
        }
    }

    /// Timed removal. Returns false if the alert was already gone.
    pub fn dismiss_auto(&self, id: AlertId) -> bool {
        let removed = self.state.lock().active.remove(&id);
        match removed {
            Some(record) => {
                debug!(id = %id, key = %record.key, "Alert auto-dismissed");
                self.release(id);
                true
            }
            None => false,
        }
    }

    /// User removal at the current time.
    pub fn dismiss_by_user(&self, id: AlertId) -> bool {
        self.dismiss_by_user_at(id, Utc::now())
    }

    /// User removal: drops the element and snoozes its key until
    /// `now + snooze_ms`. Returns false if the alert was already gone.
    pub fn dismiss_by_user_at(&self, id: AlertId, now: DateTime<Utc>) -> bool {
        let removed = {
            let mut state = self.state.lock();
            let record = state.active.remove(&id);
            if let Some(record) = &record {
                state
                    .snoozed
                    .insert(record.key.clone(), now + self.config.snooze());
            }
            record
        };

        match removed {
            Some(record) => {
                info!(
                    id = %id,
                    key = %record.key,
                    snooze_ms = self.config.snooze_ms,
                    "Alert dismissed by user"
                );
                self.release(id);
                true
            }
            None => false,
        }
    }

    fn release(&self, id: AlertId) {
        Metrics::alert_removed();
        self.sink.remove(id);
    }

    /// Remove every alert whose auto-dismiss time has passed.
    pub fn expire_due(&self, now: DateTime<Utc>) -> Vec<AlertId> {
        let due: Vec<AlertId> = {
            let mut state = self.state.lock();
            let due: Vec<AlertId> = state
                .active
                .values()
                .filter(|r| r.auto_dismiss_at <= now)
                .map(|r| r.id)
                .collect();
            for id in &due {
                state.active.remove(id);
            }
            due
        };
        for id in &due {
            self.release(*id);
        }
        due
    }

    pub fn is_snoozed(&self, key: &AlertKey, now: DateTime<Utc>) -> bool {
        self.snoozed_until(key)
            .map(|until| now < until)
            .unwrap_or(false)
    }

    /// Stored expiry, even if already in the past.
    pub fn snoozed_until(&self, key: &AlertKey) -> Option<DateTime<Utc>> {
        self.state.lock().snoozed.get(key).copied()
    }

    /// Alerts on screen, oldest first.
    pub fn active_alerts(&self) -> Vec<AlertRecord> {
        let mut records: Vec<AlertRecord> = self.state.lock().active.values().cloned().collect();
        records.sort_by_key(|r| r.rendered_at);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AlertKind;
    use chrono::TimeZone;
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap()
    }

    fn quiet_sink() -> Arc<MockAlertSink> {
        let mut sink = MockAlertSink::new();
        sink.expect_show().return_const(());
        sink.expect_remove().return_const(());
        Arc::new(sink)
    }

    fn dedup_with(sink: Arc<MockAlertSink>) -> AlertDeduplicator {
        AlertDeduplicator::new(AlertConfig::default(), sink)
    }

    fn rendered(outcome: PresentOutcome) -> AlertRecord {
        match outcome {
            PresentOutcome::Rendered(record) => record,
            other => panic!("expected rendered alert, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_sentinel_are_ignored() {
        let mut sink = MockAlertSink::new();
        sink.expect_show().times(0);
        let dedup = dedup_with(Arc::new(sink));

        assert_eq!(dedup.present_at("", t0()), PresentOutcome::Ignored);
        assert_eq!(dedup.present_at("   ", t0()), PresentOutcome::Ignored);
        assert_eq!(dedup.present_at("NONE", t0()), PresentOutcome::Ignored);
        assert!(dedup.active_alerts().is_empty());
    }

    #[test]
    fn test_render_sets_key_style_and_deadline() {
        let dedup = dedup_with(quiet_sink());
        let record = rendered(dedup.present_at("ALERT ZYSKU: AAPL +3.1%", t0()));

        assert_eq!(
            record.key,
            AlertKey::Ticker {
                kind: AlertKind::Profit,
                ticker: "AAPL".to_string()
            }
        );
        assert_eq!(record.style, AlertStyle::Warning);
        assert_eq!(record.auto_dismiss_at - record.rendered_at, chrono::Duration::seconds(20));
        assert_eq!(dedup.active_alerts().len(), 1);
    }

    #[test]
    fn test_user_dismiss_snoozes_same_key() {
        let mut sink = MockAlertSink::new();
        sink.expect_show().times(1).return_const(());
        sink.expect_remove().times(1).return_const(());
        let dedup = dedup_with(Arc::new(sink));

        let first = rendered(dedup.present_at("ALERT ZYSKU: AAPL +3.1%", t0()));
        assert!(dedup.dismiss_by_user_at(first.id, t0()));

        let second = dedup.present_at(
            "ALERT ZYSKU: AAPL +3.1%",
            t0() + chrono::Duration::milliseconds(900),
        );
        assert_eq!(
            second,
            PresentOutcome::Suppressed {
                key: first.key.clone(),
                until: t0() + chrono::Duration::minutes(30),
            }
        );
        assert!(dedup.active_alerts().is_empty());
    }

    #[test]
    fn test_snooze_is_per_key() {
        let dedup = dedup_with(quiet_sink());
        let aapl = rendered(dedup.present_at("PROFIT: AAPL +3%", t0()));
        dedup.dismiss_by_user_at(aapl.id, t0());

        assert!(dedup.present_at("PROFIT: MSFT +3%", t0()).is_rendered());
        assert!(dedup.present_at("PRICE: AAPL 190", t0()).is_rendered());
    }

    #[test]
    fn test_snooze_is_per_ticker_when_slot_is_not_a_ticker() {
        let dedup = dedup_with(quiet_sink());
        let aapl = rendered(dedup.present_at("ZYSK AAPL: +3.1%", t0()));
        assert_eq!(aapl.key.to_string(), "PROFIT-AAPL");
        assert!(dedup.dismiss_by_user_at(aapl.id, t0()));

        let later = t0() + chrono::Duration::seconds(1);
        let msft = rendered(dedup.present_at("ZYSK MSFT: +4.0%", later));
        assert_eq!(msft.key.to_string(), "PROFIT-MSFT");
        assert!(!dedup.present_at("ZYSK AAPL: +3.5%", later).is_rendered());
    }

    #[test]
    fn test_snooze_expires_at_boundary() {
        let dedup = dedup_with(quiet_sink());
        let record = rendered(dedup.present_at("PROFIT: AAPL +3%", t0()));
        dedup.dismiss_by_user_at(record.id, t0());

        let just_before = t0() + chrono::Duration::milliseconds(1_799_999);
        let boundary = t0() + chrono::Duration::milliseconds(1_800_000);
        assert!(dedup.is_snoozed(&record.key, just_before));
        assert!(!dedup.present_at("PROFIT: AAPL +3%", just_before).is_rendered());
        assert!(!dedup.is_snoozed(&record.key, boundary));
        assert!(dedup.present_at("PROFIT: AAPL +3%", boundary).is_rendered());
        // Expired entries stay in the table.
        assert!(dedup.snoozed_until(&record.key).is_some());
    }

    #[test]
    fn test_general_key_snoozes_all_general_messages() {
        let dedup = dedup_with(quiet_sink());
        let record = rendered(dedup.present_at("Engine restarted", t0()));
        assert_eq!(record.key, AlertKey::General);
        dedup.dismiss_by_user_at(record.id, t0());

        assert!(!dedup.present_at("Nightly scan finished", t0()).is_rendered());
    }

    #[test]
    fn test_double_removal_is_noop() {
        let mut sink = MockAlertSink::new();
        sink.expect_show().return_const(());
        sink.expect_remove().times(1).return_const(());
        let dedup = dedup_with(Arc::new(sink));

        let record = rendered(dedup.present_at("NEWS: TSLA recall", t0()));
        assert!(dedup.dismiss_auto(record.id));
        assert!(!dedup.dismiss_auto(record.id));
        assert!(!dedup.dismiss_by_user_at(record.id, t0()));
        // Already removed by the timer, so no snooze is written.
        assert!(dedup.snoozed_until(&record.key).is_none());
    }

    #[test]
    fn test_expire_due() {
        let dedup = dedup_with(quiet_sink());
        let early = rendered(dedup.present_at("NEWS: TSLA recall", t0()));
        let late = rendered(dedup.present_at(
            "PRICE: NVDA 900",
            t0() + chrono::Duration::seconds(10),
        ));

        let expired = dedup.expire_due(t0() + chrono::Duration::seconds(20));
        assert_eq!(expired, vec![early.id]);
        assert_eq!(dedup.active_alerts(), vec![late]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_dismiss_fires_once_after_delay() {
        let mut sink = MockAlertSink::new();
        sink.expect_show().times(1).return_const(());
        sink.expect_remove().times(1).return_const(());
        let dedup = Arc::new(dedup_with(Arc::new(sink)));

        let record = rendered(dedup.present("TP: AAPL hit 200"));
        tokio::time::sleep(Duration::from_millis(19_999)).await;
        assert_eq!(dedup.active_alerts().len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(dedup.active_alerts().is_empty());
        assert!(!dedup.dismiss_auto(record.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_dismiss_before_timer_removes_once() {
        let mut sink = MockAlertSink::new();
        sink.expect_show().times(1).return_const(());
        sink.expect_remove().times(1).return_const(());
        let dedup = Arc::new(dedup_with(Arc::new(sink)));

        let record = rendered(dedup.present("SL: AMD below stop"));
        assert!(dedup.dismiss_by_user(record.id));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(dedup.active_alerts().is_empty());
        assert!(dedup.is_snoozed(&record.key, Utc::now()));
    }
}
