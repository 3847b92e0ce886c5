//! Push-based observability for Predictrade
//!
//! This module provides observability through **outbound data only** - no HTTP server,
//! no incoming requests:
//!
//! 1. **Structured logs** for every training run and cycle ([`MetricsObserver`])
//! 2. **Periodic JSON snapshots** on stdout ([`MetricsReporter`])

pub mod cycle_metrics;
pub mod metrics;
pub mod reporter;

pub use cycle_metrics::MetricsObserver;
pub use metrics::Metrics;
pub use reporter::MetricsReporter;
