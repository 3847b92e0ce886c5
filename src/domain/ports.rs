use crate::domain::errors::{ExecutionError, MarketDataError, ModelError};
use crate::domain::market::price_series::PriceSeries;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ml::windowing::{TrainingSample, Window};
use crate::domain::trading::decision::Decision;
use async_trait::async_trait;

#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Most recent `limit` candles, oldest first.
    async fn fetch_recent_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<PriceSeries, MarketDataError>;

    /// Last traded price.
    async fn fetch_current_price(&self, symbol: &str) -> Result<f64, MarketDataError>;
}

#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Places an order for an actionable decision (Buy or Sell).
    async fn execute(&self, decision: Decision, symbol: &str) -> Result<(), ExecutionError>;
}

/// Black-box regression capability: learns to map a window to the next value.
pub trait ForecastModel: Send + Sync {
    fn fit(&self, samples: &[TrainingSample]) -> Result<Box<dyn TrainedModel>, ModelError>;

    /// Get model name/type
    fn name(&self) -> &str;
}

/// Output of one `ForecastModel::fit` call. Inference never mutates it.
pub trait TrainedModel: Send + Sync {
    fn infer(&self, window: &Window) -> Result<f64, ModelError>;
}
