use crate::domain::errors::{ExecutionError, ForecastError, MarketDataError};
use std::fmt;
use thiserror::Error;

/// Step of the cycle an error or timeout belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchCandles,
    Train,
    Predict,
    FetchPrice,
    Execute,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::FetchCandles => "fetch_candles",
            Stage::Train => "train",
            Stage::Predict => "predict",
            Stage::FetchPrice => "fetch_price",
            Stage::Execute => "execute",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can end a training run or an operating cycle
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Stage {stage} timed out after {duration_ms}ms")]
    Timeout { stage: Stage, duration_ms: u64 },

    #[error("Stage {stage} worker failed: {reason}")]
    Worker { stage: Stage, reason: String },

    #[error("Cancelled by shutdown")]
    Cancelled,
}

impl CycleError {
    /// Transient errors are retried after the short interval; everything else
    /// stops the loop.
    pub fn is_transient(&self) -> bool {
        match self {
            CycleError::MarketData(_)
            | CycleError::Execution(_)
            | CycleError::Timeout { .. }
            | CycleError::Worker { .. } => true,
            CycleError::Forecast(e) => e.is_transient(),
            CycleError::Cancelled => false,
        }
    }

    /// Low-cardinality label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::MarketData(_) => "market_data",
            CycleError::Forecast(e) if e.is_transient() => "model",
            CycleError::Forecast(_) => "forecast",
            CycleError::Execution(_) => "execution",
            CycleError::Timeout { .. } => "timeout",
            CycleError::Worker { .. } => "worker",
            CycleError::Cancelled => "cancelled",
        }
    }
}
