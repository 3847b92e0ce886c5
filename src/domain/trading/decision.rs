//! Forecast-to-action rule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete trading action derived from one forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Decision {
    Sell,
    Hold,
    Buy,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Buy => "buy",
            Decision::Sell => "sell",
            Decision::Hold => "hold",
        }
    }

    /// Whether this decision results in an order being sent.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Decision::Hold)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => write!(f, "BUY"),
            Decision::Sell => write!(f, "SELL"),
            Decision::Hold => write!(f, "HOLD"),
        }
    }
}

/// Buy when the forecast clears `observed * (1 + threshold)`, sell when it falls
/// below `observed * (1 - threshold)`, hold otherwise. Both comparisons are strict.
///
/// The threshold is not validated. At or above 1 the sell band drops below zero,
/// so Sell is unreachable for non-negative forecasts. Callers must guard against NaN inputs.
pub fn decide(predicted: f64, observed: f64, threshold: f64) -> Decision {
    if predicted > observed * (1.0 + threshold) {
        Decision::Buy
    } else if predicted < observed * (1.0 - threshold) {
        Decision::Sell
    } else {
        Decision::Hold
    }
}

/// Deviation-threshold policy with a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    threshold: f64,
}

impl DecisionPolicy {
    pub const DEFAULT_THRESHOLD: f64 = 0.01;

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, predicted: f64, observed: f64) -> Decision {
        decide(predicted, observed, self.threshold)
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenarios() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide(102.0, 100.0), Decision::Buy);
        assert_eq!(policy.decide(98.9, 100.0), Decision::Sell);
        assert_eq!(policy.decide(100.5, 100.0), Decision::Hold);
        // 100 * 0.99 is exactly 99.0, the lower band edge.
        assert_eq!(policy.decide(99.0, 100.0), Decision::Hold);
    }

    #[test]
    fn test_boundaries_hold() {
        let observed = 200.0;
        let threshold = 0.25;
        assert_eq!(
            decide(observed * (1.0 + threshold), observed, threshold),
            Decision::Hold
        );
        assert_eq!(
            decide(observed * (1.0 - threshold), observed, threshold),
            Decision::Hold
        );
    }

    #[test]
    fn test_zero_threshold_only_holds_on_equality() {
        assert_eq!(decide(100.0, 100.0, 0.0), Decision::Hold);
        assert_eq!(decide(100.0001, 100.0, 0.0), Decision::Buy);
        assert_eq!(decide(99.9999, 100.0, 0.0), Decision::Sell);
    }

    #[test]
    fn test_large_threshold_disables_selling() {
        for predicted in [0.0, 0.5, 50.0, 150.0, 250.0] {
            assert_eq!(decide(predicted, 100.0, 1.5), Decision::Hold);
        }
        assert_eq!(decide(0.0, 100.0, 1.0), Decision::Hold);
        assert_eq!(decide(1_000.0, 100.0, 1.0), Decision::Buy);
    }

    #[test]
    fn test_monotonic_in_prediction() {
        let observed = 100.0;
        let threshold = 0.01;
        let mut previous = Decision::Sell;
        let mut predicted = 90.0;
        while predicted < 110.0 {
            let decision = decide(predicted, observed, threshold);
            assert!(
                decision >= previous,
                "{:?} after {:?} at {}",
                decision,
                previous,
                predicted
            );
            previous = decision;
            predicted += 0.05;
        }
        assert_eq!(previous, Decision::Buy);
    }

    #[test]
    fn test_only_hold_is_not_actionable() {
        assert!(Decision::Buy.is_actionable());
        assert!(Decision::Sell.is_actionable());
        assert!(!Decision::Hold.is_actionable());
        assert_eq!(Decision::Buy.to_string(), "BUY");
        assert_eq!(Decision::Hold.as_str(), "hold");
    }
}
