use crate::domain::errors::{ExecutionError, MarketDataError};
use crate::domain::market::price_series::{Candle, PriceSeries};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{ExecutionService, MarketDataService};
use crate::domain::trading::decision::Decision;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Per-bar return bound of the simulated walk (0.5%).
const DEFAULT_VOLATILITY: f64 = 0.005;

/// Most recent paper fills kept in memory.
pub const PAPER_FILL_HISTORY: usize = 256;

fn base_price(symbol: &str) -> f64 {
    if symbol.contains("BTC") {
        96000.0
    } else if symbol.contains("ETH") {
        3400.0
    } else {
        100.0
    }
}

struct Walk {
    rng: StdRng,
    histories: HashMap<(String, Timeframe), Vec<Candle>>,
    last_close: HashMap<String, f64>,
}

impl Walk {
    fn shape(&mut self, timestamp: i64, open: f64, close: f64, volatility: f64) -> Candle {
        let upper = self.rng.random_range(0.0..=volatility / 2.0);
        let lower = self.rng.random_range(0.0..=volatility / 2.0);
        Candle {
            timestamp,
            open,
            high: open.max(close) * (1.0 + upper),
            low: open.min(close) * (1.0 - lower),
            close,
            volume: self.rng.random_range(1.0..100.0),
        }
    }

    fn forward(&mut self, timestamp: i64, open: f64, volatility: f64) -> Candle {
        let r = self.rng.random_range(-volatility..=volatility);
        self.shape(timestamp, open, open * (1.0 + r), volatility)
    }

    fn backward(&mut self, timestamp: i64, close: f64, volatility: f64) -> Candle {
        let r = self.rng.random_range(-volatility..=volatility);
        self.shape(timestamp, close / (1.0 + r), close, volatility)
    }
}

/// Offline market data: a seeded random walk per symbol and timeframe.
///
/// History is extended on demand (forward as wall-clock bars close, backward
/// when a larger window is requested), so consecutive fetches overlap
/// consistently, like a real exchange would.
pub struct MockMarketDataService {
    walk: Mutex<Walk>,
    volatility: f64,
}

impl MockMarketDataService {
    pub fn new(seed: u64) -> Self {
        Self::with_volatility(seed, DEFAULT_VOLATILITY)
    }

    pub fn with_volatility(seed: u64, volatility: f64) -> Self {
        Self {
            walk: Mutex::new(Walk {
                rng: StdRng::seed_from_u64(seed),
                histories: HashMap::new(),
                last_close: HashMap::new(),
            }),
            volatility: volatility.abs(),
        }
    }

    /// Candles ending at the bar open containing `now_ms`.
    pub async fn candles_at(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
        now_ms: i64,
    ) -> Result<PriceSeries, MarketDataError> {
        let vol = self.volatility;
        let step = timeframe.to_millis();
        let current_open = now_ms - now_ms.rem_euclid(step);

        let mut walk = self.walk.lock().await;
        let key = (symbol.to_string(), timeframe);
        let mut history = walk.histories.remove(&key).unwrap_or_default();

        if history.is_empty() && limit > 0 {
            let mut open = base_price(symbol);
            let first_ts = current_open - (limit as i64 - 1) * step;
            for i in 0..limit as i64 {
                let candle = walk.forward(first_ts + i * step, open, vol);
                open = candle.close;
                history.push(candle);
            }
        }

        while let Some(last) = history.last().copied() {
            if last.timestamp >= current_open {
                break;
            }
            let candle = walk.forward(last.timestamp + step, last.close, vol);
            history.push(candle);
        }

        if history.len() < limit {
            let mut older = Vec::with_capacity(limit - history.len());
            let (mut ts, mut close) = match history.first() {
                Some(first) => (first.timestamp, first.open),
                None => (current_open + step, base_price(symbol)),
            };
            for _ in history.len()..limit {
                ts -= step;
                let candle = walk.backward(ts, close, vol);
                close = candle.open;
                older.push(candle);
            }
            older.reverse();
            older.append(&mut history);
            history = older;
        }

        let start = history.len().saturating_sub(limit);
        let window = history[start..].to_vec();
        if let Some(last) = window.last() {
            walk.last_close.insert(symbol.to_string(), last.close);
        }
        walk.histories.insert(key, history);

        debug!(
            "MockMarketDataService: {} x {} bars for {}",
            window.len(),
            timeframe,
            symbol
        );
        PriceSeries::new(symbol, window)
    }
}

impl Default for MockMarketDataService {
    fn default() -> Self {
        Self::new(42)
    }
}

#[async_trait]
impl MarketDataService for MockMarketDataService {
    async fn fetch_recent_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<PriceSeries, MarketDataError> {
        self.candles_at(symbol, timeframe, limit, chrono::Utc::now().timestamp_millis())
            .await
    }

    async fn fetch_current_price(&self, symbol: &str) -> Result<f64, MarketDataError> {
        let tick = self.volatility / 10.0;
        let mut walk = self.walk.lock().await;
        let last = walk
            .last_close
            .get(symbol)
            .copied()
            .unwrap_or_else(|| base_price(symbol));
        let noise = walk.rng.random_range(-tick..=tick);
        Ok(last * (1.0 + noise))
    }
}

/// A decision that would have been sent to the exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperFill {
    pub decision: Decision,
    pub symbol: String,
    pub quantity: Decimal,
    pub timestamp: i64,
}

#[derive(Default)]
struct FillLog {
    recent: VecDeque<PaperFill>,
    total: u64,
}

/// Execution that only records and logs; no order ever leaves the process.
///
/// Keeps the last [`PAPER_FILL_HISTORY`] fills plus a running total.
pub struct PaperExecutionService {
    quantity: Decimal,
    capacity: usize,
    fills: RwLock<FillLog>,
}

impl PaperExecutionService {
    pub fn new(quantity: Decimal) -> Self {
        Self::with_capacity(quantity, PAPER_FILL_HISTORY)
    }

    pub fn with_capacity(quantity: Decimal, capacity: usize) -> Self {
        Self {
            quantity,
            capacity: capacity.max(1),
            fills: RwLock::new(FillLog::default()),
        }
    }

    /// Retained fills, oldest first.
    pub async fn fills(&self) -> Vec<PaperFill> {
        self.fills.read().await.recent.iter().cloned().collect()
    }
}

#[async_trait]
impl ExecutionService for PaperExecutionService {
    async fn execute(&self, decision: Decision, symbol: &str) -> Result<(), ExecutionError> {
        if !decision.is_actionable() {
            return Ok(());
        }

        let mut log = self.fills.write().await;
        if log.recent.len() == self.capacity {
            log.recent.pop_front();
        }
        log.recent.push_back(PaperFill {
            decision,
            symbol: symbol.to_string(),
            quantity: self.quantity,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
        log.total += 1;
        info!(
            "PaperExecution: {} {} {} (not sent, paper fill #{})",
            decision, self.quantity, symbol, log.total
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HOUR_MS: i64 = 3_600_000;
    const NOW: i64 = 1_700_000_000_000;

    #[tokio::test]
    async fn test_walk_returns_requested_window() {
        let market = MockMarketDataService::new(7);
        let series = market
            .candles_at("BTC/USDT", Timeframe::OneHour, 100, NOW)
            .await
            .unwrap();

        assert_eq!(series.len(), 100);
        let candles = series.candles();
        assert_eq!(candles[99].timestamp, NOW - NOW % HOUR_MS);
        for pair in candles.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, HOUR_MS);
            // Each bar opens where the previous one closed.
            assert!((pair[1].open - pair[0].close).abs() < 1e-6);
        }
        for c in candles {
            assert!(c.high >= c.open.max(c.close));
            assert!(c.low <= c.open.min(c.close));
            assert!(c.close > 0.0);
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_path() {
        let a = MockMarketDataService::new(11);
        let b = MockMarketDataService::new(11);

        let sa = a.candles_at("ETH/USDT", Timeframe::OneHour, 50, NOW).await.unwrap();
        let sb = b.candles_at("ETH/USDT", Timeframe::OneHour, 50, NOW).await.unwrap();

        assert_eq!(sa, sb);
    }

    #[tokio::test]
    async fn test_windows_overlap_across_fetches() {
        let market = MockMarketDataService::new(3);

        let training = market
            .candles_at("BTC/USDT", Timeframe::OneHour, 60, NOW)
            .await
            .unwrap();
        // Larger window extends backwards; one bar later extends forwards.
        let wider = market
            .candles_at("BTC/USDT", Timeframe::OneHour, 200, NOW + HOUR_MS)
            .await
            .unwrap();

        assert_eq!(wider.len(), 200);
        let tail = &wider.candles()[139..199];
        assert_eq!(tail, training.candles());
    }

    #[tokio::test]
    async fn test_current_price_tracks_last_close() {
        let market = MockMarketDataService::new(5);
        let series = market
            .candles_at("BTC/USDT", Timeframe::OneHour, 10, NOW)
            .await
            .unwrap();
        let last_close = series.last().unwrap().close;

        let price = market.fetch_current_price("BTC/USDT").await.unwrap();

        assert!((price / last_close - 1.0).abs() <= DEFAULT_VOLATILITY / 10.0 + 1e-12);
    }

    #[tokio::test]
    async fn test_paper_execution_records_only_actionable_decisions() {
        let exec = PaperExecutionService::new(dec!(0.001));

        exec.execute(Decision::Buy, "BTC/USDT").await.unwrap();
        exec.execute(Decision::Hold, "BTC/USDT").await.unwrap();
        exec.execute(Decision::Sell, "BTC/USDT").await.unwrap();

        let fills = exec.fills().await;
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].decision, Decision::Buy);
        assert_eq!(fills[1].decision, Decision::Sell);
        assert_eq!(fills[1].quantity, dec!(0.001));
    }

    #[tokio::test]
    async fn test_paper_fill_history_is_bounded() {
        let exec = PaperExecutionService::with_capacity(dec!(0.001), 3);

        for decision in [
            Decision::Buy,
            Decision::Sell,
            Decision::Buy,
            Decision::Sell,
            Decision::Sell,
        ] {
            exec.execute(decision, "BTC/USDT").await.unwrap();
        }

        let fills = exec.fills().await;
        assert_eq!(fills.len(), 3);
        let kept: Vec<Decision> = fills.iter().map(|f| f.decision).collect();
        assert_eq!(kept, vec![Decision::Buy, Decision::Sell, Decision::Sell]);
    }
}
