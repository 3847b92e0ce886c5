use crate::domain::errors::MarketDataError;
use serde::{Deserialize, Serialize};

/// One OHLCV bar. Timestamps are Unix milliseconds at bar open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candles for one symbol, oldest first, with strictly increasing timestamps.
///
/// Built fresh from every fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    candles: Vec<Candle>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Result<Self, MarketDataError> {
        let symbol = symbol.into();

        if let Some(pos) = candles
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(MarketDataError::InvalidData {
                reason: format!(
                    "timestamps not strictly increasing at index {} ({} -> {})",
                    pos + 1,
                    candles[pos].timestamp,
                    candles[pos + 1].timestamp
                ),
                symbol,
            });
        }

        Ok(Self { symbol, candles })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Closing prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(timestamp: i64, close: f64) -> Candle {
        Candle {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn test_closes_in_order() {
        let series = PriceSeries::new(
            "BTC/USDT",
            vec![candle(1, 10.0), candle(2, 11.0), candle(3, 12.5)],
        )
        .unwrap();

        assert_eq!(series.closes(), vec![10.0, 11.0, 12.5]);
        assert_eq!(series.last().map(|c| c.close), Some(12.5));
        assert_eq!(series.symbol(), "BTC/USDT");
    }

    #[test]
    fn test_rejects_non_increasing_timestamps() {
        let err = PriceSeries::new("BTC/USDT", vec![candle(1, 10.0), candle(1, 11.0)]).unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidData { .. }));

        let err = PriceSeries::new("BTC/USDT", vec![candle(5, 10.0), candle(4, 11.0)]).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_empty_series_is_valid() {
        let series = PriceSeries::new("ETH/USDT", vec![]).unwrap();
        assert!(series.is_empty());
        assert!(series.closes().is_empty());
    }
}
