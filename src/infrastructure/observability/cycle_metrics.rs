use crate::application::trading_loop::{
    CycleError, CycleObserver, CycleReport, LogObserver, TrainingReport,
};
use crate::infrastructure::observability::metrics::Metrics;
use std::time::Duration;

/// Logs every loop event and mirrors it into Prometheus metrics.
#[derive(Clone)]
pub struct MetricsObserver {
    metrics: Metrics,
    log: LogObserver,
}

impl MetricsObserver {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
            log: LogObserver,
        }
    }
}

impl CycleObserver for MetricsObserver {
    fn on_training_complete(&self, report: &TrainingReport) {
        self.log.on_training_complete(report);
        self.metrics.record_training(report.samples);
    }

    fn on_cycle_success(&self, report: &CycleReport, next_cycle_in: Duration) {
        self.log.on_cycle_success(report, next_cycle_in);
        self.metrics.record_success(
            report.decision.as_str(),
            report.predicted,
            report.observed,
            report.elapsed_ms as f64 / 1000.0,
        );
    }

    fn on_cycle_failure(&self, cycle: u64, error: &CycleError, retry_in: Duration) {
        self.log.on_cycle_failure(cycle, error, retry_in);
        self.metrics.record_failure(error.kind());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::MarketDataError;
    use crate::domain::trading::decision::Decision;

    #[test]
    fn test_events_reach_metrics() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        let observer = MetricsObserver::new(metrics.clone());

        observer.on_training_complete(&TrainingReport {
            symbol: "BTC/USDT".to_string(),
            candles: 1000,
            samples: 940,
            elapsed_ms: 1200,
        });
        observer.on_cycle_success(
            &CycleReport {
                cycle: 1,
                symbol: "BTC/USDT".to_string(),
                decision: Decision::Sell,
                predicted: 98.0,
                observed: 100.0,
                executed: true,
                elapsed_ms: 150,
            },
            Duration::from_secs(3600),
        );
        observer.on_cycle_failure(
            2,
            &CycleError::MarketData(MarketDataError::ConnectionLost {
                reason: "reset".to_string(),
            }),
            Duration::from_secs(60),
        );

        assert_eq!(metrics.training_samples.get(), 940.0);
        assert_eq!(metrics.counter(&metrics.decisions_total, "sell"), 1.0);
        assert_eq!(
            metrics.counter(&metrics.cycle_failures_total, "market_data"),
            1.0
        );
        assert_eq!(metrics.last_prediction.get(), 98.0);
    }
}
