use super::error::CycleError;
use crate::domain::trading::decision::Decision;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of the one-off training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub symbol: String,
    pub candles: usize,
    pub samples: usize,
    pub elapsed_ms: u64,
}

/// Outcome of one successful cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub symbol: String,
    pub decision: Decision,
    pub predicted: f64,
    pub observed: f64,
    /// False for Hold, which never reaches the executor.
    pub executed: bool,
    pub elapsed_ms: u64,
}

/// Receives loop events. Keeps reporting out of the scheduling logic.
pub trait CycleObserver: Send + Sync {
    fn on_training_complete(&self, report: &TrainingReport);

    fn on_cycle_success(&self, report: &CycleReport, next_cycle_in: Duration);

    fn on_cycle_failure(&self, cycle: u64, error: &CycleError, retry_in: Duration);
}

/// Structured log lines only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl CycleObserver for LogObserver {
    fn on_training_complete(&self, report: &TrainingReport) {
        info!(
            symbol = %report.symbol,
            candles = report.candles,
            samples = report.samples,
            elapsed_ms = report.elapsed_ms,
            "TradingLoop: Model trained"
        );
    }

    fn on_cycle_success(&self, report: &CycleReport, next_cycle_in: Duration) {
        info!(
            cycle = report.cycle,
            symbol = %report.symbol,
            decision = %report.decision,
            predicted = report.predicted,
            observed = report.observed,
            executed = report.executed,
            "TradingLoop: {} {} (next cycle in {:?})",
            report.decision,
            report.symbol,
            next_cycle_in
        );
    }

    fn on_cycle_failure(&self, cycle: u64, error: &CycleError, retry_in: Duration) {
        warn!(
            cycle,
            kind = error.kind(),
            "TradingLoop: Cycle failed: {}. Retrying in {:?}",
            error,
            retry_in
        );
    }
}
