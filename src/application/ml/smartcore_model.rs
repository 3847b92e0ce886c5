use crate::domain::errors::ModelError;
use crate::domain::ml::windowing::{TrainingSample, Window};
use crate::domain::ports::{ForecastModel, TrainedModel};
use anyhow::anyhow;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

type ForestModel = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;
type LinearModel = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Which smartcore regressor backs the forecaster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    RandomForest,
    Linear,
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random_forest" | "rf" => Ok(ModelKind::RandomForest),
            "linear" => Ok(ModelKind::Linear),
            _ => Err(anyhow!(
                "Invalid MODEL_KIND: {}. Must be 'random_forest' or 'linear'",
                s
            )),
        }
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_split: 5,
        }
    }
}

pub fn build_model(kind: ModelKind, params: ForestParams) -> Arc<dyn ForecastModel> {
    match kind {
        ModelKind::RandomForest => Arc::new(RandomForestForecastModel::new(params)),
        ModelKind::Linear => Arc::new(LinearForecastModel),
    }
}

fn samples_to_matrix(
    samples: &[TrainingSample],
) -> Result<(DenseMatrix<f64>, Vec<f64>), ModelError> {
    let rows: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| s.window.values().to_vec())
        .collect();
    let targets: Vec<f64> = samples.iter().map(|s| s.target).collect();

    let x = DenseMatrix::from_2d_vec(&rows).map_err(|e| ModelError::FitFailed {
        reason: format!("Matrix creation failed: {}", e),
    })?;
    Ok((x, targets))
}

fn window_to_matrix(window: &Window) -> Result<DenseMatrix<f64>, ModelError> {
    DenseMatrix::from_2d_vec(&vec![window.values().to_vec()]).map_err(|e| {
        ModelError::InferenceFailed {
            reason: format!("Matrix creation failed: {}", e),
        }
    })
}

fn first_prediction(predictions: Vec<f64>) -> Result<f64, ModelError> {
    predictions
        .first()
        .copied()
        .ok_or_else(|| ModelError::InferenceFailed {
            reason: "No prediction returned".to_string(),
        })
}

/// Random forest regressor over the lookback window.
pub struct RandomForestForecastModel {
    params: ForestParams,
}

impl RandomForestForecastModel {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }
}

impl ForecastModel for RandomForestForecastModel {
    fn fit(&self, samples: &[TrainingSample]) -> Result<Box<dyn TrainedModel>, ModelError> {
        let (x, y) = samples_to_matrix(samples)?;
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.params.n_trees)
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_split);

        let model = ForestModel::fit(&x, &y, params).map_err(|e| ModelError::FitFailed {
            reason: format!("Training error: {}", e),
        })?;

        info!(
            "SmartCore: Random forest trained ({} trees, depth {}) on {} samples",
            self.params.n_trees,
            self.params.max_depth,
            samples.len()
        );
        Ok(Box::new(TrainedForest { model }))
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }
}

struct TrainedForest {
    model: ForestModel,
}

impl TrainedModel for TrainedForest {
    fn infer(&self, window: &Window) -> Result<f64, ModelError> {
        let input = window_to_matrix(window)?;
        let predictions = self
            .model
            .predict(&input)
            .map_err(|e| ModelError::InferenceFailed {
                reason: format!("Prediction failed: {}", e),
            })?;
        first_prediction(predictions)
    }
}

/// Ordinary least squares over the lookback window.
pub struct LinearForecastModel;

impl ForecastModel for LinearForecastModel {
    fn fit(&self, samples: &[TrainingSample]) -> Result<Box<dyn TrainedModel>, ModelError> {
        let (x, y) = samples_to_matrix(samples)?;
        let model = LinearModel::fit(&x, &y, LinearRegressionParameters::default()).map_err(
            |e| ModelError::FitFailed {
                reason: format!("Training error: {}", e),
            },
        )?;

        info!(
            "SmartCore: Linear regression trained on {} samples",
            samples.len()
        );
        Ok(Box::new(TrainedLinear { model }))
    }

    fn name(&self) -> &str {
        "SmartCore Linear Regression"
    }
}

struct TrainedLinear {
    model: LinearModel,
}

impl TrainedModel for TrainedLinear {
    fn infer(&self, window: &Window) -> Result<f64, ModelError> {
        let input = window_to_matrix(window)?;
        let predictions = self
            .model
            .predict(&input)
            .map_err(|e| ModelError::InferenceFailed {
                reason: format!("Prediction failed: {}", e),
            })?;
        first_prediction(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::windowing::{build_inference_window, build_training_windows};

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 0.5 + 0.4 * (i as f64 * 0.3).sin())
            .collect()
    }

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!(
            ModelKind::from_str("random_forest").unwrap(),
            ModelKind::RandomForest
        );
        assert_eq!(ModelKind::from_str("LINEAR").unwrap(), ModelKind::Linear);
        assert!(ModelKind::from_str("lstm").is_err());
    }

    #[test]
    fn test_random_forest_fits_and_predicts_in_range() {
        let series = wave(200);
        let samples = build_training_windows(&series, 10).unwrap();
        let model = RandomForestForecastModel::new(ForestParams {
            n_trees: 10,
            max_depth: 6,
            min_split: 2,
        });

        let trained = model.fit(&samples).unwrap();
        let window = build_inference_window(&series, 10).unwrap();
        let predicted = trained.infer(&window).unwrap();

        // Tree ensembles average training targets, so they stay inside their range.
        assert!((0.1..=0.9).contains(&predicted), "predicted {}", predicted);
    }

    #[test]
    fn test_build_model_names() {
        let forest = build_model(ModelKind::RandomForest, ForestParams::default());
        assert_eq!(forest.name(), "SmartCore Random Forest");

        let linear = build_model(ModelKind::Linear, ForestParams::default());
        assert_eq!(linear.name(), "SmartCore Linear Regression");
    }
}
