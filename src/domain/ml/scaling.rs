//! Min/max price scaling.
//!
//! Prices are mapped linearly into `[0, 1]` using the range observed on a
//! reference series. Later series are transformed with the same range, so
//! values outside it land slightly beyond the unit interval. That is expected.

use crate::domain::errors::ScalingError;

/// Value range learned from a reference series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingState {
    min: f64,
    max: f64,
}

impl ScalingState {
    /// Learns the range of `series`.
    pub fn fit(series: &[f64]) -> Result<Self, ScalingError> {
        if series.is_empty() {
            return Err(ScalingError::EmptySeries);
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (index, &value) in series.iter().enumerate() {
            if !value.is_finite() {
                return Err(ScalingError::NonFinite { index, value });
            }
            min = min.min(value);
            max = max.max(value);
        }

        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    // A flat reference series has no spread; every value maps to 0.
    fn scale(&self) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 { 1.0 } else { range }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / self.scale()
    }

    pub fn denormalize(&self, value: f64) -> f64 {
        value * self.scale() + self.min
    }
}

/// Scaler with an explicit fitted/unfitted lifecycle.
#[derive(Debug, Clone, Default)]
pub struct WindowScaler {
    state: Option<ScalingState>,
}

impl WindowScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fits the scaler on `series`, replacing any previous range.
    pub fn fit(&mut self, series: &[f64]) -> Result<ScalingState, ScalingError> {
        let state = ScalingState::fit(series)?;
        self.state = Some(state);
        Ok(state)
    }

    pub fn state(&self) -> Result<&ScalingState, ScalingError> {
        self.state.as_ref().ok_or(ScalingError::NotFitted)
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    pub fn transform(&self, series: &[f64]) -> Result<Vec<f64>, ScalingError> {
        let state = self.state()?;
        Ok(series.iter().map(|&v| state.normalize(v)).collect())
    }

    pub fn inverse_transform(&self, value: f64) -> Result<f64, ScalingError> {
        Ok(self.state()?.denormalize(value))
    }
}

impl From<ScalingState> for WindowScaler {
    fn from(state: ScalingState) -> Self {
        Self { state: Some(state) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_maps_into_unit_range() {
        let mut scaler = WindowScaler::new();
        scaler.fit(&[100.0, 150.0, 200.0]).unwrap();

        let scaled = scaler.transform(&[100.0, 150.0, 200.0]).unwrap();
        assert_eq!(scaled, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_out_of_range_values_are_not_clamped() {
        let mut scaler = WindowScaler::new();
        scaler.fit(&[100.0, 200.0]).unwrap();

        let scaled = scaler.transform(&[210.0, 90.0]).unwrap();
        assert!((scaled[0] - 1.1).abs() < 1e-12);
        assert!((scaled[1] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_within_fit_range() {
        let series = [42_000.5, 43_120.25, 41_999.0, 44_800.75, 43_000.0];
        let mut scaler = WindowScaler::new();
        scaler.fit(&series).unwrap();

        for &x in &series {
            let scaled = scaler.transform(&[x]).unwrap()[0];
            let restored = scaler.inverse_transform(scaled).unwrap();
            assert!((restored - x).abs() < 1e-9, "{} != {}", restored, x);
        }
    }

    #[test]
    fn test_unfitted_scaler_is_rejected() {
        let scaler = WindowScaler::new();
        assert_eq!(scaler.transform(&[1.0]), Err(ScalingError::NotFitted));
        assert_eq!(scaler.inverse_transform(0.5), Err(ScalingError::NotFitted));
    }

    #[test]
    fn test_flat_series_maps_to_zero() {
        let mut scaler = WindowScaler::new();
        scaler.fit(&[5.0, 5.0, 5.0]).unwrap();

        assert_eq!(scaler.transform(&[5.0]).unwrap(), vec![0.0]);
        assert_eq!(scaler.inverse_transform(0.0).unwrap(), 5.0);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let mut scaler = WindowScaler::new();
        assert_eq!(scaler.fit(&[]), Err(ScalingError::EmptySeries));
        assert!(matches!(
            scaler.fit(&[1.0, f64::NAN]),
            Err(ScalingError::NonFinite { index: 1, .. })
        ));
        assert!(!scaler.is_fitted());
    }
}
