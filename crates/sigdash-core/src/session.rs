//! US equity market session clock.
//!
//! Classifies an instant into a session phase and computes the countdown to
//! the next phase transition. Boundaries are fixed civil times in the
//! exchange zone:
//! - pre-market open 04:00
//! - regular open 09:30
//! - regular close 16:00
//! - after-market close 20:00
//!
//! Target instants are built in the exchange zone itself, so a countdown that
//! spans a daylight-saving switch is an hour shorter or longer than the naive
//! wall-clock difference.

use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
    Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Default reference zone for the exchange calendar.
pub const DEFAULT_EXCHANGE_TZ: &str = "America/New_York";

const PRE_MARKET_OPEN: (u32, u32) = (4, 0);
const REGULAR_OPEN: (u32, u32) = (9, 30);
const REGULAR_CLOSE: (u32, u32) = (16, 0);
const AFTER_MARKET_CLOSE: (u32, u32) = (20, 0);

/// Market session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketSession {
    /// Saturday and Sunday.
    Weekend,
    /// Weekday 04:00 – 09:30.
    PreMarket,
    /// Weekday 09:30 – 16:00.
    Regular,
    /// Weekday 16:00 – 20:00.
    AfterMarket,
    /// Weekday 20:00 – 04:00.
    Closed,
}

impl fmt::Display for MarketSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekend => write!(f, "WEEKEND"),
            Self::PreMarket => write!(f, "PRE_MARKET"),
            Self::Regular => write!(f, "REGULAR"),
            Self::AfterMarket => write!(f, "AFTER_MARKET"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// What the countdown is counting towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountdownTarget {
    PreMarketOpen,
    MarketOpen,
    MarketClose,
}

impl CountdownTarget {
    /// Human-readable label shown next to the countdown.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PreMarketOpen => "time to pre-market open",
            Self::MarketOpen => "time to market open",
            Self::MarketClose => "time to market close",
        }
    }
}

/// Result of one countdown computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub session: MarketSession,
    pub target_kind: CountdownTarget,
    /// Instant of the next transition.
    pub target: DateTime<Utc>,
    /// Time left until `target`, never negative.
    pub remaining: Duration,
}

impl Countdown {
    pub fn label(&self) -> &'static str {
        self.target_kind.label()
    }

    pub fn remaining_ms(&self) -> i64 {
        self.remaining.num_milliseconds()
    }

    /// Remaining time formatted as `[Dd ]HH:MM:SS`.
    pub fn formatted(&self) -> String {
        format_remaining(self.remaining)
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.formatted())
    }
}

/// Format a duration as `HH:MM:SS`, prefixed with `Nd ` when at least one
/// whole day remains. Negative input is clamped to zero.
pub fn format_remaining(remaining: Duration) -> String {
    let total_secs = remaining.num_seconds().max(0);
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Classify a civil date-time in the exchange zone.
#[must_use]
pub fn session_at(local: NaiveDateTime) -> MarketSession {
    if is_weekend(local.weekday()) {
        return MarketSession::Weekend;
    }
    let minute = minute_of_day(local);
    if minute < as_minutes(PRE_MARKET_OPEN) {
        MarketSession::Closed
    } else if minute < as_minutes(REGULAR_OPEN) {
        MarketSession::PreMarket
    } else if minute < as_minutes(REGULAR_CLOSE) {
        MarketSession::Regular
    } else if minute < as_minutes(AFTER_MARKET_CLOSE) {
        MarketSession::AfterMarket
    } else {
        MarketSession::Closed
    }
}

/// Compute the countdown for an instant already expressed in the exchange zone.
#[must_use]
pub fn compute_countdown<Z: TimeZone>(now: &DateTime<Z>) -> Countdown {
    let local = now.naive_local();
    let session = session_at(local);
    let today = local.date();
    let minute = minute_of_day(local);

    let (target_kind, date, boundary) = match local.weekday() {
        Weekday::Sat => (
            CountdownTarget::PreMarketOpen,
            today + Duration::days(2),
            PRE_MARKET_OPEN,
        ),
        Weekday::Sun => (
            CountdownTarget::PreMarketOpen,
            today + Duration::days(1),
            PRE_MARKET_OPEN,
        ),
        weekday => {
            if minute < as_minutes(PRE_MARKET_OPEN) {
                (CountdownTarget::PreMarketOpen, today, PRE_MARKET_OPEN)
            } else if minute < as_minutes(REGULAR_OPEN) {
                (CountdownTarget::MarketOpen, today, REGULAR_OPEN)
            } else if minute < as_minutes(REGULAR_CLOSE) {
                (CountdownTarget::MarketClose, today, REGULAR_CLOSE)
            } else {
                let days_ahead = if weekday == Weekday::Fri { 3 } else { 1 };
                (
                    CountdownTarget::PreMarketOpen,
                    today + Duration::days(days_ahead),
                    PRE_MARKET_OPEN,
                )
            }
        }
    };

    let target = resolve_in_zone(&now.timezone(), civil(date, boundary));
    let remaining = target
        .clone()
        .signed_duration_since(now.clone())
        .max(Duration::zero());

    Countdown {
        session,
        target_kind,
        target: target.with_timezone(&Utc),
        remaining,
    }
}

/// Time source bound to the exchange zone.
///
/// If the configured zone name cannot be resolved, every tick falls back to
/// the machine's local zone and logs a warning; the clock never fails.
#[derive(Debug, Clone)]
pub struct MarketClock {
    zone_name: String,
    zone: Option<Tz>,
}

impl MarketClock {
    /// Create a clock for the named IANA zone.
    pub fn new(zone_name: impl Into<String>) -> Self {
        let zone_name = zone_name.into();
        let zone = match zone_name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(e) => {
                warn!(
                    zone = %zone_name,
                    error = %e,
                    "Unknown exchange timezone, countdown will use local time"
                );
                None
            }
        };
        Self { zone_name, zone }
    }

    /// Clock for the default exchange zone.
    pub fn new_york() -> Self {
        Self {
            zone_name: DEFAULT_EXCHANGE_TZ.to_string(),
            zone: Some(chrono_tz::America::New_York),
        }
    }

    pub fn zone_name(&self) -> &str {
        &self.zone_name
    }

    /// Whether the exchange zone resolved; `false` means local-time fallback.
    pub fn is_exchange_zone(&self) -> bool {
        self.zone.is_some()
    }

    /// Countdown for the current instant.
    pub fn countdown(&self) -> Countdown {
        self.countdown_at(Utc::now())
    }

    /// Countdown for a given UTC instant.
    pub fn countdown_at(&self, now: DateTime<Utc>) -> Countdown {
        match self.zone {
            Some(tz) => compute_countdown(&now.with_timezone(&tz)),
            None => {
                warn!(
                    zone = %self.zone_name,
                    "Exchange timezone unavailable, using local time for this tick"
                );
                compute_countdown(&now.with_timezone(&Local))
            }
        }
    }
}

impl Default for MarketClock {
    fn default() -> Self {
        Self::new_york()
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

fn minute_of_day(local: NaiveDateTime) -> u32 {
    local.hour() * 60 + local.minute()
}

fn as_minutes((hour, minute): (u32, u32)) -> u32 {
    hour * 60 + minute
}

fn civil(date: NaiveDate, (hour, minute): (u32, u32)) -> NaiveDateTime {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    NaiveDateTime::new(date, time)
}

/// Map a civil time to an instant in `tz`.
///
/// Ambiguous times (fall-back) take the earlier instant; times inside a
/// spring-forward gap move one hour later.
fn resolve_in_zone<Z: TimeZone>(tz: &Z, local: NaiveDateTime) -> DateTime<Z> {
    if let Some(dt) = tz.from_local_datetime(&local).earliest() {
        return dt;
    }
    if let Some(dt) = tz.from_local_datetime(&(local + Duration::hours(1))).earliest() {
        return dt;
    }
    tz.from_utc_datetime(&local)
}
