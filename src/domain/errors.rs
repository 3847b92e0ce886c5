use thiserror::Error;

/// Errors raised by the min/max price scaler
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScalingError {
    #[error("Scaler used before fit: call fit() on a reference series first")]
    NotFitted,

    #[error("Cannot fit scaler on an empty series")]
    EmptySeries,

    #[error("Non-finite value {value} at index {index}")]
    NonFinite { index: usize, value: f64 },
}

/// Errors raised while slicing a normalized series into lookback windows
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WindowError {
    #[error("Insufficient data: lookback {lookback} needs {required} values, got {actual}")]
    InsufficientData {
        lookback: usize,
        required: usize,
        actual: usize,
    },

    #[error("Lookback must be at least 1")]
    InvalidLookback,
}

/// Errors surfaced by the opaque forecasting model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model fit failed: {reason}")]
    FitFailed { reason: String },

    #[error("Model inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("Model produced a non-finite prediction: {value}")]
    NonFinitePrediction { value: f64 },
}

/// Errors related to the forecaster lifecycle
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Model has not been trained: train() must succeed before predict_next()")]
    ModelNotTrained,

    #[error("Training data too short: need at least {required} prices, got {actual}")]
    TrainingData { required: usize, actual: usize },

    #[error(transparent)]
    Scaling(#[from] ScalingError),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ForecastError {
    /// Only failures of the model itself are worth retrying; everything else
    /// means the caller broke the train-before-predict sequence or fed bad history.
    pub fn is_transient(&self) -> bool {
        matches!(self, ForecastError::Model(_))
    }
}

/// Errors related to market data and connectivity
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("Connection lost: {reason}")]
    ConnectionLost { reason: String },

    #[error("Invalid market data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },

    #[error("Service timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Rate limit exceeded: retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Circuit breaker open: {reason}")]
    CircuitOpen { reason: String },
}

/// Errors related to order placement
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Order rejected for {symbol}: {reason}")]
    Rejected { symbol: String, reason: String },

    #[error("Order execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Circuit breaker open: {reason}")]
    CircuitOpen { reason: String },
}
