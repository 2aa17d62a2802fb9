//! Edge-triggered profit threshold alerts.

use crate::dedup::{AlertDeduplicator, PresentOutcome};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use sigdash_core::{PortfolioHolding, Price};
use sigdash_telemetry::Metrics;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Fires one profit alert per upward crossing of the threshold ratio.
///
/// A ticker's flag is set when `price / average_buy_price` reaches the
/// threshold and cleared, silently, once the ratio drops below it again.
/// While the flag is set no further alert is produced for that ticker.
pub struct ProfitAlertMonitor {
    dedup: Arc<AlertDeduplicator>,
    threshold: Decimal,
    fired: Mutex<HashSet<String>>,
}

impl ProfitAlertMonitor {
    pub fn new(dedup: Arc<AlertDeduplicator>) -> Self {
        let threshold = dedup.config().profit_threshold;
        Self {
            dedup,
            threshold,
            fired: Mutex::new(HashSet::new()),
        }
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// Evaluate every holding whose price resolves through `price_of`.
    ///
    /// Returns the outcome of each alert handed to the deduplicator.
    pub fn evaluate<F>(&self, holdings: &[PortfolioHolding], price_of: F) -> Vec<PresentOutcome>
    where
        F: Fn(&str) -> Option<Price>,
    {
        let mut messages = Vec::new();
        {
            let mut fired = self.fired.lock();
            for holding in holdings {
                let Some(price) = price_of(&holding.ticker) else {
                    trace!(ticker = %holding.ticker, "No quote, skipping profit check");
                    continue;
                };
                let Some(ratio) = price.ratio_to(holding.average_buy_price) else {
                    continue;
                };

                if ratio >= self.threshold {
                    if fired.insert(holding.ticker.clone()) {
                        messages.push((holding.ticker.clone(), profit_message(holding, price)));
                    }
                } else if fired.remove(&holding.ticker) {
                    debug!(ticker = %holding.ticker, ratio = %ratio, "Profit flag cleared");
                }
            }
        }

        messages
            .into_iter()
            .map(|(ticker, message)| {
                Metrics::profit_crossing(&ticker);
                self.dedup.present(&message)
            })
            .collect()
    }

    /// Forget every flag. Called when the portfolio is reloaded.
    pub fn reset(&self) {
        self.fired.lock().clear();
    }

    pub fn is_fired(&self, ticker: &str) -> bool {
        self.fired.lock().contains(ticker)
    }
}

fn profit_message(holding: &PortfolioHolding, price: Price) -> String {
    let gain = price
        .pct_from(holding.average_buy_price)
        .unwrap_or_default()
        .round_dp(2);
    format!(
        "PROFIT ALERT: {} +{}% (price {}, avg {})",
        holding.ticker, gain, price, holding.average_buy_price
    )
}
