//! Quote payload normalization.
//!
//! The quote endpoint forwards the upstream provider's field names verbatim,
//! e.g. `"05. price"` or `"10. change percent"`, sometimes wrapped in a
//! `"Global Quote"` object. Keys are normalized to `snake_case` without the
//! numeric prefix before any field is read.

use crate::error::{ClientError, ClientResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sigdash_core::{Price, QuoteSnapshot};

const WRAPPER_KEY: &str = "Global Quote";

/// Strip a leading `NN. ` prefix and convert the rest to `snake_case`.
///
/// `"05. price"` → `"price"`, `"08. previous close"` → `"previous_close"`.
pub fn normalize_key(key: &str) -> String {
    let trimmed = key.trim();
    let without_prefix = match trimmed.split_once('.') {
        Some((prefix, rest))
            if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest.trim_start()
        }
        _ => trimmed,
    };
    without_prefix
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase()
}

/// Normalize every key of a raw quote object, unwrapping `"Global Quote"`.
pub fn normalize_quote_fields(raw: &Value) -> Map<String, Value> {
    let object = match raw.get(WRAPPER_KEY) {
        Some(inner) if inner.is_object() => inner,
        _ => raw,
    };

    object
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(k, v)| (normalize_key(k), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a raw quote payload into a `QuoteSnapshot`.
///
/// Any missing or non-numeric price field yields `MalformedQuote` for this
/// ticker only; callers render a placeholder for that row.
pub fn parse_quote(ticker: &str, raw: &Value) -> ClientResult<QuoteSnapshot> {
    let fields = normalize_quote_fields(raw);

    let price = decimal_field(ticker, &fields, "price")?;
    let change = decimal_field(ticker, &fields, "change")?;
    let change_percent = decimal_field(ticker, &fields, "change_percent")?;
    let previous_close = decimal_field(ticker, &fields, "previous_close")?;
    let as_of = fields
        .get("latest_trading_day")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());

    Ok(QuoteSnapshot {
        price: Price::new(price),
        change,
        change_percent,
        previous_close: Price::new(previous_close),
        as_of,
    })
}

fn decimal_field(ticker: &str, fields: &Map<String, Value>, name: &str) -> ClientResult<Decimal> {
    let malformed = |value: String| ClientError::MalformedQuote {
        ticker: ticker.to_string(),
        field: name.to_string(),
        value,
    };

    match fields.get(name) {
        Some(Value::String(s)) => s
            .trim()
            .trim_end_matches('%')
            .parse::<Decimal>()
            .map_err(|_| malformed(s.clone())),
        Some(Value::Number(n)) => n
            .to_string()
            .parse::<Decimal>()
            .map_err(|_| malformed(n.to_string())),
        Some(other) => Err(malformed(other.to_string())),
        None => Err(malformed("<missing>".to_string())),
    }
}
