pub mod forecaster;
pub mod smartcore_model;

pub use forecaster::{Forecaster, SharedForecaster, TrainedForecast};
pub use smartcore_model::{ForestParams, ModelKind, build_model};
