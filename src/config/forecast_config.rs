//! Forecast and decision configuration parsing from environment variables.
//!
//! This module handles the lookback window, training history size, model
//! selection and the decision threshold.

use crate::application::ml::smartcore_model::{ForestParams, ModelKind};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;

/// Forecast environment configuration
#[derive(Debug, Clone)]
pub struct ForecastEnvConfig {
    // Windowing
    pub lookback: usize,
    pub training_size: usize,
    pub prediction_window: usize,

    // Decision
    pub decision_threshold: f64,
    pub order_quantity: Decimal,

    // Model
    pub model_kind: ModelKind,
    pub forest: ForestParams,
}

impl Default for ForecastEnvConfig {
    fn default() -> Self {
        Self {
            lookback: 60,
            training_size: 1000,
            prediction_window: 60,
            decision_threshold: 0.01,
            order_quantity: dec!(0.001),
            model_kind: ModelKind::RandomForest,
            forest: ForestParams::default(),
        }
    }
}

impl ForecastEnvConfig {
    pub fn from_env() -> Result<Self> {
        let lookback = Self::parse_usize("LOOKBACK", 60)?;

        let model_kind_str =
            env::var("MODEL_KIND").unwrap_or_else(|_| "random_forest".to_string());
        let model_kind = ModelKind::from_str(&model_kind_str)?;

        let order_quantity = env::var("ORDER_QUANTITY")
            .unwrap_or_else(|_| "0.001".to_string())
            .parse::<Decimal>()
            .context("Failed to parse ORDER_QUANTITY")?;

        Ok(Self {
            lookback,
            training_size: Self::parse_usize("TRAINING_SIZE", 1000)?,
            // The prediction fetch only needs the lookback by default.
            prediction_window: Self::parse_usize("PREDICTION_WINDOW", lookback)?,
            decision_threshold: Self::parse_f64("DECISION_THRESHOLD", 0.01)?,
            order_quantity,
            model_kind,
            forest: ForestParams {
                n_trees: Self::parse_usize("MODEL_N_TREES", 100)?,
                max_depth: env::var("MODEL_MAX_DEPTH")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse::<u16>()
                    .context("Failed to parse MODEL_MAX_DEPTH")?,
                min_split: Self::parse_usize("MODEL_MIN_SPLIT", 5)?,
            },
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback == 0 {
            anyhow::bail!("LOOKBACK must be at least 1");
        }
        if self.training_size <= self.lookback {
            anyhow::bail!(
                "TRAINING_SIZE ({}) must exceed LOOKBACK ({})",
                self.training_size,
                self.lookback
            );
        }
        if self.prediction_window < self.lookback {
            anyhow::bail!(
                "PREDICTION_WINDOW ({}) must be at least LOOKBACK ({})",
                self.prediction_window,
                self.lookback
            );
        }
        if !self.decision_threshold.is_finite() || self.decision_threshold < 0.0 {
            anyhow::bail!(
                "DECISION_THRESHOLD must be a non-negative number, got {}",
                self.decision_threshold
            );
        }
        if self.order_quantity <= Decimal::ZERO {
            anyhow::bail!("ORDER_QUANTITY must be positive");
        }
        Ok(())
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ForecastEnvConfig::default();
        assert_eq!(config.lookback, 60);
        assert_eq!(config.training_size, 1000);
        assert!((config.decision_threshold - 0.01).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_training_history() {
        let config = ForecastEnvConfig {
            training_size: 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_prediction_window() {
        let config = ForecastEnvConfig {
            prediction_window: 59,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PREDICTION_WINDOW"));
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let config = ForecastEnvConfig {
            decision_threshold: -0.01,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        // Thresholds above 1 are allowed even though they disable selling.
        let permissive = ForecastEnvConfig {
            decision_threshold: 1.5,
            ..Default::default()
        };
        assert!(permissive.validate().is_ok());
    }
}
