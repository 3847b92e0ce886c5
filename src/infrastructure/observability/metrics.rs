//! Prometheus metrics definitions for Predictrade
//!
//! All metrics use the `predictrade_` prefix and are read-only.

use prometheus::{
    CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

/// Prometheus metrics for the decision loop
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Finished cycles by outcome (success/failure)
    pub cycles_total: CounterVec,
    /// Failed cycles by error kind
    pub cycle_failures_total: CounterVec,
    /// Decisions taken (buy/sell/hold)
    pub decisions_total: CounterVec,
    /// Last predicted price
    pub last_prediction: GenericGauge<AtomicF64>,
    /// Last observed market price
    pub last_observed_price: GenericGauge<AtomicF64>,
    /// 1 once a model is installed
    pub model_trained: GenericGauge<AtomicF64>,
    /// Windows used by the current model
    pub training_samples: GenericGauge<AtomicF64>,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
    /// Wall time of successful cycles
    pub cycle_duration_seconds: Histogram,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let cycles_total = CounterVec::new(
            Opts::new("predictrade_cycles_total", "Finished cycles by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(cycles_total.clone()))?;

        let cycle_failures_total = CounterVec::new(
            Opts::new(
                "predictrade_cycle_failures_total",
                "Failed cycles by error kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(cycle_failures_total.clone()))?;

        let decisions_total = CounterVec::new(
            Opts::new("predictrade_decisions_total", "Decisions taken"),
            &["decision"],
        )?;
        registry.register(Box::new(decisions_total.clone()))?;

        let last_prediction = Gauge::with_opts(Opts::new(
            "predictrade_last_prediction",
            "Last predicted price",
        ))?;
        registry.register(Box::new(last_prediction.clone()))?;

        let last_observed_price = Gauge::with_opts(Opts::new(
            "predictrade_last_observed_price",
            "Last observed market price",
        ))?;
        registry.register(Box::new(last_observed_price.clone()))?;

        let model_trained = Gauge::with_opts(Opts::new(
            "predictrade_model_trained",
            "Whether a trained model is installed (0/1)",
        ))?;
        registry.register(Box::new(model_trained.clone()))?;

        let training_samples = Gauge::with_opts(Opts::new(
            "predictrade_training_samples",
            "Training windows used by the current model",
        ))?;
        registry.register(Box::new(training_samples.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "predictrade_uptime_seconds",
            "Process uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let cycle_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "predictrade_cycle_duration_seconds",
                "Duration of successful cycles in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;
        registry.register(Box::new(cycle_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            cycles_total,
            cycle_failures_total,
            decisions_total,
            last_prediction,
            last_observed_price,
            model_trained,
            training_samples,
            uptime_seconds,
            cycle_duration_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn record_success(&self, decision: &str, predicted: f64, observed: f64, elapsed_secs: f64) {
        self.cycles_total.with_label_values(&["success"]).inc();
        self.decisions_total.with_label_values(&[decision]).inc();
        self.last_prediction.set(predicted);
        self.last_observed_price.set(observed);
        self.cycle_duration_seconds.observe(elapsed_secs);
    }

    pub fn record_failure(&self, kind: &str) {
        self.cycles_total.with_label_values(&["failure"]).inc();
        self.cycle_failures_total.with_label_values(&[kind]).inc();
    }

    pub fn record_training(&self, samples: usize) {
        self.model_trained.set(1.0);
        self.training_samples.set(samples as f64);
    }

    /// Counter value for one label, used by the JSON snapshot.
    pub fn counter(&self, counter: &CounterVec, label: &str) -> f64 {
        counter.with_label_values(&[label]).get()
    }
}
