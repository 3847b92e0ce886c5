//! Push-based metrics reporter for Predictrade
//!
//! Periodically outputs metrics as structured JSON to stdout.
//!
//! **Security**: This system only SENDS data, never accepts requests.

use crate::application::system::shutdown_service::{ShutdownSignal, Wake};
use crate::infrastructure::observability::metrics::Metrics;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Metrics snapshot for JSON output
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub symbol: String,
    pub model: ModelSnapshot,
    pub cycles: CycleSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ModelSnapshot {
    pub trained: bool,
    pub training_samples: u64,
    pub last_prediction: Option<f64>,
    pub last_observed_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CycleSnapshot {
    pub succeeded: u64,
    pub failed: u64,
    pub buy: u64,
    pub sell: u64,
    pub hold: u64,
}

/// Push-based metrics reporter
///
/// Outputs metrics as structured JSON logs on a configurable interval until
/// shutdown. No HTTP server, no incoming connections.
pub struct MetricsReporter {
    metrics: Metrics,
    symbol: String,
    start_time: Instant,
    interval: Duration,
    shutdown: ShutdownSignal,
}

impl MetricsReporter {
    pub fn new(
        metrics: Metrics,
        symbol: impl Into<String>,
        interval_seconds: u64,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            metrics,
            symbol: symbol.into(),
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
            shutdown,
        }
    }

    /// Run the reporter in a loop, outputting metrics periodically
    pub async fn run(self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        while self.shutdown.sleep(self.interval).await == Wake::Elapsed {
            let snapshot = self.collect_snapshot();
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    // Prefix so log shippers can filter these lines
                    println!("METRICS_JSON:{}", json);
                    info!(
                        "Cycles: {} ok / {} failed | Last prediction: {:?} | Uptime: {}s",
                        snapshot.cycles.succeeded,
                        snapshot.cycles.failed,
                        snapshot.model.last_prediction,
                        snapshot.uptime_seconds
                    );
                }
                Err(e) => warn!("Failed to serialize metrics: {}", e),
            }
            debug!("MetricsReporter: Prometheus exposition\n{}", self.metrics.render());
        }

        info!("MetricsReporter: Stopped");
    }

    /// Collect current metrics snapshot
    fn collect_snapshot(&self) -> MetricsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();
        self.metrics.uptime_seconds.set(uptime as f64);

        let m = &self.metrics;
        let count = |v: f64| v as u64;
        let succeeded = count(m.counter(&m.cycles_total, "success"));
        let trained = m.model_trained.get() > 0.0;

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            symbol: self.symbol.clone(),
            model: ModelSnapshot {
                trained,
                training_samples: count(m.training_samples.get()),
                // Gauges read 0 until the first successful cycle.
                last_prediction: (succeeded > 0).then(|| m.last_prediction.get()),
                last_observed_price: (succeeded > 0).then(|| m.last_observed_price.get()),
            },
            cycles: CycleSnapshot {
                succeeded,
                failed: count(m.counter(&m.cycles_total, "failure")),
                buy: count(m.counter(&m.decisions_total, "buy")),
                sell: count(m.counter(&m.decisions_total, "sell")),
                hold: count(m.counter(&m.decisions_total, "hold")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::system::shutdown_service::shutdown_channel;

    #[test]
    fn test_metrics_snapshot_collection() {
        let (_trigger, signal) = shutdown_channel();
        let metrics = Metrics::new().expect("Failed to create metrics");
        let reporter = MetricsReporter::new(metrics.clone(), "BTC/USDT", 60, signal);

        let empty = reporter.collect_snapshot();
        assert!(!empty.model.trained);
        assert_eq!(empty.model.last_prediction, None);

        metrics.record_training(939);
        metrics.record_success("buy", 101.0, 100.0, 0.1);
        metrics.record_failure("timeout");

        let snapshot = reporter.collect_snapshot();
        assert!(snapshot.model.trained);
        assert_eq!(snapshot.model.training_samples, 939);
        assert_eq!(snapshot.model.last_prediction, Some(101.0));
        assert_eq!(snapshot.cycles.succeeded, 1);
        assert_eq!(snapshot.cycles.failed, 1);
        assert_eq!(snapshot.cycles.buy, 1);

        let json = serde_json::to_string(&snapshot).expect("Failed to serialize");
        assert!(json.contains("BTC/USDT"));
    }

    #[tokio::test]
    async fn test_reporter_stops_on_shutdown() {
        let (trigger, signal) = shutdown_channel();
        let metrics = Metrics::new().expect("Failed to create metrics");
        let reporter = MetricsReporter::new(metrics, "BTC/USDT", 3600, signal);

        let handle = tokio::spawn(reporter.run());
        trigger.trigger();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("reporter should stop promptly")
            .expect("reporter task panicked");
    }
}
