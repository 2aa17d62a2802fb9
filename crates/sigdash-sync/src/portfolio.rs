//! Portfolio loading, quote refresh and trade actions.

use crate::context::{DashboardContext, QuoteCell};
use crate::error::SyncResult;
use crate::view::{NoticeLevel, ViewSink};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use sigdash_alerts::ProfitAlertMonitor;
use sigdash_client::DashboardApi;
use sigdash_core::{CoreError, PortfolioHolding, Price, Quantity, TradeOrder, TradeSide};
use sigdash_telemetry::Metrics;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shown in place of valuation columns when a quote is malformed.
pub const PARSE_ERROR_PLACEHOLDER: &str = "parsing error";

/// Valuation columns of a holding row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Valuation {
    /// No quote fetched yet.
    Pending,
    Priced {
        price: Price,
        market_value: Decimal,
        pnl: Decimal,
        pnl_pct: Decimal,
        /// Percent the price still has to move to reach take-profit.
        take_profit_distance_pct: Option<Decimal>,
    },
    ParseError { reason: String },
}

/// One rendered portfolio row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingRow {
    pub ticker: String,
    pub quantity: Quantity,
    pub average_buy_price: Price,
    pub take_profit: Option<Price>,
    pub cost_basis: Decimal,
    pub valuation: Valuation,
}

impl HoldingRow {
    pub fn build(holding: &PortfolioHolding, quote: Option<&QuoteCell>) -> Self {
        let cost_basis = holding.cost_basis();
        let valuation = match quote {
            None => Valuation::Pending,
            Some(QuoteCell::ParseError(reason)) => Valuation::ParseError {
                reason: reason.clone(),
            },
            Some(QuoteCell::Ready(quote)) => {
                let price = quote.price;
                let market_value = holding.quantity.value_at(price);
                let pnl = market_value - cost_basis;
                Valuation::Priced {
                    price,
                    market_value,
                    pnl,
                    pnl_pct: price
                        .pct_from(holding.average_buy_price)
                        .unwrap_or_default()
                        .round_dp(2),
                    take_profit_distance_pct: holding
                        .take_profit
                        .and_then(|tp| tp.pct_from(price))
                        .map(|pct| pct.round_dp(2)),
                }
            }
        };

        Self {
            ticker: holding.ticker.clone(),
            quantity: holding.quantity,
            average_buy_price: holding.average_buy_price,
            take_profit: holding.take_profit,
            cost_basis,
            valuation,
        }
    }

    /// Text for the market value column.
    pub fn market_value_text(&self) -> String {
        match &self.valuation {
            Valuation::Pending => "-".to_string(),
            Valuation::Priced { market_value, .. } => market_value.round_dp(2).to_string(),
            Valuation::ParseError { .. } => PARSE_ERROR_PLACEHOLDER.to_string(),
        }
    }
}

/// Portfolio operations shared by the quote loop and user actions.
pub struct PortfolioDesk {
    api: Arc<dyn DashboardApi>,
    ctx: Arc<DashboardContext>,
    view: Arc<dyn ViewSink>,
    profit: Arc<ProfitAlertMonitor>,
}

impl PortfolioDesk {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        ctx: Arc<DashboardContext>,
        view: Arc<dyn ViewSink>,
        profit: Arc<ProfitAlertMonitor>,
    ) -> Self {
        Self {
            api,
            ctx,
            view,
            profit,
        }
    }

    /// Fetch the portfolio from scratch.
    ///
    /// Clears the quote cache and the profit flags, then renders rows with
    /// pending valuations. Returns the number of holdings.
    pub async fn reload(&self) -> SyncResult<usize> {
        let holdings = self.api.portfolio().await?;
        for holding in &holdings {
            if let Err(e) = holding.validate() {
                warn!(ticker = %holding.ticker, error = %e, "Invalid holding in portfolio");
            }
        }
        let count = holdings.len();
        self.ctx.replace_portfolio(holdings);
        self.profit.reset();
        info!(holdings = count, "Portfolio reloaded");
        self.render();
        Ok(count)
    }

    /// Fetch a quote for every held ticker, then run the profit check.
    ///
    /// A failed request leaves that ticker's previous entry in place. Returns
    /// the number of tickers that were refreshed successfully.
    pub async fn refresh_quotes(&self) -> usize {
        let tickers = self.ctx.tickers();
        let results = join_all(tickers.iter().map(|ticker| self.api.quote(ticker))).await;

        let mut refreshed = 0;
        for (ticker, result) in tickers.iter().zip(results) {
            match result {
                Ok(quote) => {
                    self.ctx.set_quote(ticker, QuoteCell::Ready(quote));
                    refreshed += 1;
                }
                Err(e) if e.is_malformed_data() => {
                    warn!(ticker = %ticker, error = %e, "Malformed quote");
                    Metrics::quote_parse_error(ticker);
                    self.ctx.set_quote(ticker, QuoteCell::ParseError(e.to_string()));
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Quote fetch failed");
                }
            }
        }

        let holdings = self.ctx.portfolio();
        self.profit.evaluate(&holdings, |ticker| self.ctx.price_of(ticker));
        debug!(refreshed, total = tickers.len(), "Quotes refreshed");
        self.render();
        refreshed
    }

    pub fn rows(&self) -> Vec<HoldingRow> {
        self.ctx
            .portfolio()
            .iter()
            .map(|h| HoldingRow::build(h, self.ctx.quote(&h.ticker).as_ref()))
            .collect()
    }

    fn render(&self) {
        self.view.portfolio(&self.rows());
    }

    /// Validate and submit a buy, then reload the portfolio.
    pub async fn buy(&self, ticker: &str, quantity: Quantity, price: Price) -> SyncResult<()> {
        let order = TradeOrder::new(ticker, quantity, price)?;
        self.submit(TradeSide::Buy, order).await
    }

    /// Validate and submit a sell, then reload the portfolio.
    ///
    /// Selling more than is held is rejected before any request is sent.
    pub async fn sell(&self, ticker: &str, quantity: Quantity, price: Price) -> SyncResult<()> {
        let order = TradeOrder::new(ticker, quantity, price)?;
        let held = self.ctx.held_quantity(&order.ticker);
        if order.quantity > held {
            return Err(CoreError::InsufficientHolding {
                ticker: order.ticker,
                held: held.to_string(),
                requested: order.quantity.to_string(),
            }
            .into());
        }
        self.submit(TradeSide::Sell, order).await
    }

    async fn submit(&self, side: TradeSide, order: TradeOrder) -> SyncResult<()> {
        match self.api.trade(side, &order).await {
            Ok(_) => {
                info!(
                    side = side.as_path(),
                    ticker = %order.ticker,
                    quantity = %order.quantity,
                    price = %order.price_per_share,
                    "Trade accepted"
                );
                self.view.notice(
                    NoticeLevel::Success,
                    &format!("{} {} {} accepted", side.as_path(), order.quantity, order.ticker),
                );
                self.reload().await?;
                Ok(())
            }
            Err(e) => {
                warn!(side = side.as_path(), ticker = %order.ticker, error = %e, "Trade rejected");
                self.view.notice(NoticeLevel::Error, &e.to_string());
                Err(e.into())
            }
        }
    }
}
