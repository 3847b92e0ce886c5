//! Binance Market Data Service
//!
//! Public REST endpoints only:
//! - Historical candles (`/api/v3/klines`), paged backwards with `endTime`
//! - Last traded price (`/api/v3/ticker/price`)

use super::common::{describe_failure, is_rate_limited, to_exchange_symbol};
use crate::domain::errors::MarketDataError;
use crate::domain::market::price_series::{Candle, PriceSeries};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::MarketDataService;
use crate::infrastructure::core::circuit_breaker::{
    CircuitBreaker, CircuitBreakerError, CircuitBreakerPolicy,
};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Binance caps a single klines request at 1000 rows.
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

pub struct BinanceMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
    circuit_breaker: CircuitBreaker,
}

impl BinanceMarketDataService {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(request_timeout),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            circuit_breaker: CircuitBreaker::new(
                "BinanceMarketData",
                CircuitBreakerPolicy::default(),
            ),
        }
    }

    async fn get_json<T>(&self, url: &str, symbol: &str) -> Result<T, MarketDataError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let call = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| MarketDataError::ConnectionLost {
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                if is_rate_limited(status) {
                    let retry_after_secs = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    return Err(MarketDataError::RateLimitExceeded { retry_after_secs });
                }
                let body = response.text().await.unwrap_or_default();
                let reason = describe_failure(status, &body);
                return Err(if status.is_server_error() {
                    MarketDataError::ConnectionLost { reason }
                } else {
                    MarketDataError::InvalidData {
                        symbol: symbol.to_string(),
                        reason,
                    }
                });
            }

            response
                .json::<T>()
                .await
                .map_err(|e| MarketDataError::InvalidData {
                    symbol: symbol.to_string(),
                    reason: format!("unreadable response: {}", e),
                })
        };

        self.circuit_breaker.call(call).await.map_err(|e| match e {
            CircuitBreakerError::Open(reason) => MarketDataError::CircuitOpen { reason },
            CircuitBreakerError::Inner(inner) => inner,
        })
    }

    async fn fetch_klines_page(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
        end_time: Option<i64>,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit_str = limit.to_string();
        let mut params = vec![
            ("symbol", to_exchange_symbol(symbol)),
            ("interval", timeframe.to_binance_string().to_string()),
            ("limit", limit_str),
        ];
        if let Some(end) = end_time {
            params.push(("endTime", end.to_string()));
        }

        let rows: Vec<serde_json::Value> = self
            .get_json(&build_url_with_query(&url, &params), symbol)
            .await?;
        parse_klines(symbol, &rows)
    }
}

#[async_trait]
impl MarketDataService for BinanceMarketDataService {
    async fn fetch_recent_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<PriceSeries, MarketDataError> {
        let candles = collect_backwards(limit, move |page_limit, end_time| {
            self.fetch_klines_page(symbol, timeframe, page_limit, end_time)
        })
        .await?;
        info!(
            "BinanceMarketDataService: Fetched {} of {} requested {} bars for {}",
            candles.len(),
            limit,
            timeframe,
            symbol
        );
        PriceSeries::new(symbol, candles)
    }

    async fn fetch_current_price(&self, symbol: &str) -> Result<f64, MarketDataError> {
        #[derive(Debug, Deserialize)]
        struct TickerPrice {
            price: String,
        }

        let url = build_url_with_query(
            &format!("{}/api/v3/ticker/price", self.base_url),
            &[("symbol", to_exchange_symbol(symbol))],
        );
        let ticker: TickerPrice = self.get_json(&url, symbol).await?;
        let price = ticker
            .price
            .parse::<f64>()
            .map_err(|e| MarketDataError::InvalidData {
                symbol: symbol.to_string(),
                reason: format!("bad ticker price '{}': {}", ticker.price, e),
            })?;

        debug!("BinanceMarketDataService: {} last price {}", symbol, price);
        Ok(price)
    }
}

/// Collects up to `limit` most recent candles, oldest first.
///
/// `fetch_page(page_limit, end_time)` returns at most `page_limit` candles,
/// oldest first, ending at or before `end_time` (latest when `None`). Pages are
/// requested newest first; each following page ends just before the oldest bar
/// seen. A short or empty page means the history is exhausted.
async fn collect_backwards<F, Fut>(
    limit: usize,
    mut fetch_page: F,
) -> Result<Vec<Candle>, MarketDataError>
where
    F: FnMut(usize, Option<i64>) -> Fut,
    Fut: Future<Output = Result<Vec<Candle>, MarketDataError>>,
{
    let mut pages: Vec<Vec<Candle>> = Vec::new();
    let mut remaining = limit;
    let mut end_time = None;

    while remaining > 0 {
        let page_limit = remaining.min(MAX_KLINES_PER_REQUEST);
        let page = fetch_page(page_limit, end_time).await?;
        let Some(oldest) = page.first() else {
            break;
        };
        end_time = Some(oldest.timestamp - 1);
        remaining = remaining.saturating_sub(page.len());
        let exhausted = page.len() < page_limit;
        pages.push(page);
        if exhausted {
            break;
        }
    }

    Ok(pages.into_iter().rev().flatten().collect())
}

/// Klines rows look like `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`.
fn parse_klines(symbol: &str, rows: &[serde_json::Value]) -> Result<Vec<Candle>, MarketDataError> {
    let invalid = |index: usize, what: &str| MarketDataError::InvalidData {
        symbol: symbol.to_string(),
        reason: format!("malformed kline at row {}: {}", index, what),
    };

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let arr = row.as_array().ok_or_else(|| invalid(i, "not an array"))?;
            if arr.len() < 6 {
                return Err(invalid(i, "fewer than 6 fields"));
            }
            let timestamp = arr[0].as_i64().ok_or_else(|| invalid(i, "open time"))?;
            let field = |idx: usize, name: &str| -> Result<f64, MarketDataError> {
                arr[idx]
                    .as_str()
                    .and_then(|s| s.parse::<f64>().ok())
                    .ok_or_else(|| invalid(i, name))
            };
            Ok(Candle {
                timestamp,
                open: field(1, "open")?,
                high: field(2, "high")?,
                low: field(3, "low")?,
                close: field(4, "close")?,
                volume: field(5, "volume")?,
            })
        })
        .collect()
}
