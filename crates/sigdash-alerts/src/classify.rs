//! Message classification.
//!
//! Alert payloads are free text, so both the dedup key and the display style
//! are derived from ordered rule lists. The first matching rule wins and each
//! list ends in an explicit fallback (`GENERAL` / `Info`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert category that carries a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    TakeProfit,
    StopLoss,
    Profit,
    Price,
    News,
}

impl AlertKind {
    /// Key prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::TakeProfit => "TP",
            Self::StopLoss => "SL",
            Self::Profit => "PROFIT",
            Self::Price => "PRICE",
            Self::News => "NEWS",
        }
    }
}

/// Placeholder ticker used when the ticker slot holds a malformed symbol and
/// no ticker-shaped word appears elsewhere in the message.
pub const UNKNOWN_TICKER: &str = "UNKNOWN";

/// Stable dedup key of an alert message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKey {
    General,
    Ticker { kind: AlertKind, ticker: String },
}

impl AlertKey {
    /// Label used for metrics (`PROFIT`, `GENERAL`, ...).
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Ticker { kind, .. } => kind.prefix(),
        }
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => write!(f, "GENERAL"),
            Self::Ticker { kind, ticker } => write!(f, "{}-{}", kind.prefix(), ticker),
        }
    }
}

/// Visual style of a rendered alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStyle {
    Danger,
    Success,
    Warning,
    Info,
}

impl AlertStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Danger => "danger",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for AlertStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Markers are word sequences matched against the upper-cased message.
const TAKE_PROFIT_MARKERS: &[&[&str]] = &[&["TAKE", "PROFIT"], &["TP"]];
const STOP_LOSS_MARKERS: &[&[&str]] = &[&["STOP", "LOSS"], &["SL"]];
const PROFIT_MARKERS: &[&[&str]] = &[&["PROFIT"], &["ZYSK"], &["ZYSKU"]];
const PRICE_MARKERS: &[&[&str]] = &[&["PRICE"], &["CENA"], &["CENY"]];
const NEWS_MARKERS: &[&[&str]] = &[&["NEWS"], &["WIADOMOSC"], &["WIADOMOŚĆ"]];
const URGENT_MARKERS: &[&[&str]] = &[&["URGENT"], &["PILNE"], &["CRITICAL"]];
const NEGATIVE_MARKERS: &[&[&str]] = &[
    &["DROP"],
    &["DROPPED"],
    &["FALL"],
    &["CRASH"],
    &["DOWN"],
    &["SPADEK"],
];

const KEY_RULES: &[(AlertKind, &[&[&str]])] = &[
    (AlertKind::TakeProfit, TAKE_PROFIT_MARKERS),
    (AlertKind::StopLoss, STOP_LOSS_MARKERS),
    (AlertKind::Profit, PROFIT_MARKERS),
    (AlertKind::Price, PRICE_MARKERS),
    (AlertKind::News, NEWS_MARKERS),
];

/// Uppercase words that look like tickers but are part of alert wording.
const NON_TICKER_WORDS: &[&str] = &[
    "ALERT", "ALERTU", "PROFIT", "ZYSK", "ZYSKU", "PRICE", "CENA", "CENY", "NEWS", "TAKE",
    "STOP", "LOSS", "HIT", "URGENT", "PILNE", "DROP", "FALL", "CRASH", "DOWN", "SPADEK",
    "CRITICAL", "ABOVE", "BELOW",
];

/// Pre-tokenized message.
struct Message {
    words: Vec<String>,
    raw: String,
}

impl Message {
    fn new(raw: &str) -> Self {
        let words = raw
            .to_uppercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            words,
            raw: raw.to_string(),
        }
    }

    fn has_any(&self, markers: &[&[&str]]) -> bool {
        markers.iter().any(|phrase| self.has_phrase(phrase))
    }

    fn has_phrase(&self, phrase: &[&str]) -> bool {
        if phrase.is_empty() || phrase.len() > self.words.len() {
            return false;
        }
        self.words
            .windows(phrase.len())
            .any(|window| window.iter().zip(phrase).all(|(w, p)| w == p))
    }

    /// A `-` directly followed by a digit, e.g. `-4.2%`.
    fn has_negative_number(&self) -> bool {
        let bytes = self.raw.as_bytes();
        bytes
            .windows(2)
            .any(|pair| pair[0] == b'-' && pair[1].is_ascii_digit())
    }
}

/// 3–5 ASCII uppercase letters.
pub fn is_ticker_shaped(token: &str) -> bool {
    (3..=5).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_uppercase())
}

/// Strip surrounding punctuation, e.g. `"AAPL:"` or `"(NVDA),"`.
fn trim_word(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

fn is_ticker_word(word: &str) -> bool {
    is_ticker_shaped(word) && !NON_TICKER_WORDS.contains(&word)
}

/// An uppercase symbol that failed the ticker shape, e.g. `BRK.B` or `GOOGLEX`.
fn is_malformed_symbol(word: &str) -> bool {
    word.bytes().any(|b| b.is_ascii_uppercase())
        && word
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'.' || b == b'-')
}

/// Find the ticker segment of a message.
///
/// The word right after the first `:` is the explicit ticker slot and wins
/// when ticker-shaped. Otherwise the first ticker-shaped word anywhere in the
/// message is used. `UNKNOWN` only when nothing matched and the slot holds a
/// malformed symbol; `None` when the message names no ticker at all.
fn extract_ticker(raw: &str) -> Option<String> {
    let slot = raw
        .split_once(':')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .map(trim_word)
        .filter(|s| !s.is_empty());

    if let Some(slot) = slot.filter(|s| is_ticker_word(s)) {
        return Some(slot.to_string());
    }

    if let Some(word) = raw.split_whitespace().map(trim_word).find(|w| is_ticker_word(w)) {
        return Some(word.to_string());
    }

    slot.filter(|s| is_malformed_symbol(s))
        .map(|_| UNKNOWN_TICKER.to_string())
}

/// Derive the dedup key for a message.
pub fn classify_key(raw: &str) -> AlertKey {
    let message = Message::new(raw);
    let Some(kind) = KEY_RULES
        .iter()
        .find(|(_, markers)| message.has_any(markers))
        .map(|(kind, _)| *kind)
    else {
        return AlertKey::General;
    };

    match extract_ticker(raw) {
        Some(ticker) => AlertKey::Ticker { kind, ticker },
        None => AlertKey::General,
    }
}

fn urgent_negative(m: &Message) -> bool {
    m.has_any(URGENT_MARKERS) && (m.has_any(NEGATIVE_MARKERS) || m.has_negative_number())
}

fn urgent_or_take_profit(m: &Message) -> bool {
    m.has_any(URGENT_MARKERS) || m.has_any(TAKE_PROFIT_MARKERS)
}

fn price_or_profit(m: &Message) -> bool {
    m.has_any(PRICE_MARKERS) || m.has_any(PROFIT_MARKERS)
}

fn stop_loss(m: &Message) -> bool {
    m.has_any(STOP_LOSS_MARKERS)
}

const STYLE_RULES: &[(AlertStyle, fn(&Message) -> bool)] = &[
    (AlertStyle::Danger, urgent_negative),
    (AlertStyle::Success, urgent_or_take_profit),
    (AlertStyle::Warning, price_or_profit),
    (AlertStyle::Danger, stop_loss),
];

/// Derive the display style for a message.
pub fn classify_style(raw: &str) -> AlertStyle {
    let message = Message::new(raw);
    STYLE_RULES
        .iter()
        .find(|(_, matches)| matches(&message))
        .map(|(style, _)| *style)
        .unwrap_or(AlertStyle::Info)
}
