//! Stateful single-model forecaster.
//!
//! Owns the scaling range and the trained model produced by one training run.
//! Both are swapped together as one [`TrainedForecast`], so a failed `train`
//! leaves the previous state fully intact.

use crate::domain::errors::{ForecastError, ModelError};
use crate::domain::ml::scaling::{ScalingState, WindowScaler};
use crate::domain::ml::windowing::{build_inference_window, build_training_windows};
use crate::domain::ports::{ForecastModel, TrainedModel};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Forecaster shared between the trading loop and anything reading it.
/// Training takes the write lock, predictions only read.
pub type SharedForecaster = Arc<RwLock<Forecaster>>;

/// Everything one training run produces.
pub struct TrainedForecast {
    scaling: ScalingState,
    model: Box<dyn TrainedModel>,
    lookback: usize,
    samples: usize,
}

impl TrainedForecast {
    /// Scales `raw`, slices it into lookback windows and fits `model` on them.
    pub fn fit(
        model: &dyn ForecastModel,
        raw: &[f64],
        lookback: usize,
    ) -> Result<Self, ForecastError> {
        let required = lookback + 1;
        if raw.len() < required {
            return Err(ForecastError::TrainingData {
                required,
                actual: raw.len(),
            });
        }

        let mut scaler = WindowScaler::new();
        let scaling = scaler.fit(raw)?;
        let normalized = scaler.transform(raw)?;
        let training_set = build_training_windows(&normalized, lookback)?;

        info!(
            "Forecaster: Fitting {} on {} samples (lookback {}, range {:.4}..{:.4})",
            model.name(),
            training_set.len(),
            lookback,
            scaling.min(),
            scaling.max()
        );

        let trained = model.fit(&training_set)?;

        Ok(Self {
            scaling,
            model: trained,
            lookback,
            samples: training_set.len(),
        })
    }

    /// Predicts the value following the trailing `lookback` prices of `raw`.
    pub fn predict_next(&self, raw: &[f64]) -> Result<f64, ForecastError> {
        let scaler = WindowScaler::from(self.scaling);
        let normalized = scaler.transform(raw)?;
        let window = build_inference_window(&normalized, self.lookback)?;

        let scaled = self.model.infer(&window)?;
        if !scaled.is_finite() {
            return Err(ModelError::NonFinitePrediction { value: scaled }.into());
        }

        let predicted = scaler.inverse_transform(scaled)?;
        debug!(
            "Forecaster: scaled prediction {:.6} -> {:.4}",
            scaled, predicted
        );
        Ok(predicted)
    }

    pub fn scaling(&self) -> &ScalingState {
        &self.scaling
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Number of (window, target) pairs the model was fitted on.
    pub fn samples(&self) -> usize {
        self.samples
    }
}

enum ForecasterState {
    Untrained,
    Trained(Arc<TrainedForecast>),
}

pub struct Forecaster {
    model: Arc<dyn ForecastModel>,
    lookback: usize,
    state: ForecasterState,
}

impl Forecaster {
    pub fn new(model: Arc<dyn ForecastModel>, lookback: usize) -> Self {
        Self {
            model,
            lookback,
            state: ForecasterState::Untrained,
        }
    }

    pub fn into_shared(self) -> SharedForecaster {
        Arc::new(RwLock::new(self))
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn model(&self) -> Arc<dyn ForecastModel> {
        self.model.clone()
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, ForecasterState::Trained(_))
    }

    /// Trains on `raw` and replaces the current state only on success.
    pub fn train(&mut self, raw: &[f64]) -> Result<(), ForecastError> {
        let trained = TrainedForecast::fit(self.model.as_ref(), raw, self.lookback)?;
        self.install(trained);
        Ok(())
    }

    /// Installs a forecast fitted elsewhere (e.g. on a blocking thread).
    pub fn install(&mut self, trained: TrainedForecast) {
        self.state = ForecasterState::Trained(Arc::new(trained));
    }

    /// Read-only handle to the current trained state.
    pub fn trained(&self) -> Result<Arc<TrainedForecast>, ForecastError> {
        match &self.state {
            ForecasterState::Trained(trained) => Ok(trained.clone()),
            ForecasterState::Untrained => Err(ForecastError::ModelNotTrained),
        }
    }

    pub fn predict_next(&self, raw: &[f64]) -> Result<f64, ForecastError> {
        self.trained()?.predict_next(raw)
    }
}
