//! Lookback windows over a normalized series.

use crate::domain::errors::WindowError;

/// Fixed-length run of consecutive normalized values.
///
/// Only constructed by the functions in this module, which guarantee the
/// length equals the requested lookback.
#[derive(Debug, Clone, PartialEq)]
pub struct Window(Vec<f64>);

impl Window {
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// A window paired with the value that immediately follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub window: Window,
    pub target: f64,
}

/// Slides a window of `lookback` values over `series`.
///
/// Sample `i` covers `series[i..i + lookback]` and targets `series[i + lookback]`,
/// giving `series.len() - lookback` samples.
pub fn build_training_windows(
    series: &[f64],
    lookback: usize,
) -> Result<Vec<TrainingSample>, WindowError> {
    if lookback == 0 {
        return Err(WindowError::InvalidLookback);
    }
    if series.len() <= lookback {
        return Err(WindowError::InsufficientData {
            lookback,
            required: lookback + 1,
            actual: series.len(),
        });
    }

    Ok(series
        .windows(lookback + 1)
        .map(|chunk| TrainingSample {
            window: Window(chunk[..lookback].to_vec()),
            target: chunk[lookback],
        })
        .collect())
}

/// Takes the trailing `lookback` values of `series` as the prediction input.
pub fn build_inference_window(series: &[f64], lookback: usize) -> Result<Window, WindowError> {
    if lookback == 0 {
        return Err(WindowError::InvalidLookback);
    }
    if series.len() < lookback {
        return Err(WindowError::InsufficientData {
            lookback,
            required: lookback,
            actual: series.len(),
        });
    }

    Ok(Window(series[series.len() - lookback..].to_vec()))
}
