//! Predictrade - headless prediction-driven decision loop
//!
//! Trains a forecaster once on recent history, then every cycle predicts the
//! next close, compares it with the live price and buys, sells or holds.
//! Metrics are pushed via structured JSON logs to stdout.
//!
//! # Usage
//! ```sh
//! MODE=binance SYMBOL=BTC/USDT TIMEFRAME=1h cargo run --bin predictrade
//! ```
//!
//! # Environment Variables
//! - `MODE` - `mock` (simulated prices) or `binance` (default: mock)
//! - `EXECUTION_MODE` - `paper` or `live` (default: paper)
//! - `LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `OBSERVABILITY_INTERVAL` - Seconds between metric snapshots (default: 60)

use anyhow::Result;
use predictrade::application::system::Application;
use predictrade::config::{Config, LogFormat, ObservabilityEnvConfig};
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;

fn init_logging(format: LogFormat) {
    let filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false).pretty())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logging first, so config errors are reported through it
    init_logging(ObservabilityEnvConfig::from_env().log_format);

    info!("Predictrade {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Mode={:?}, Execution={:?}, Symbol={}, Timeframe={}, Lookback={}",
        config.mode,
        config.execution_mode,
        config.symbol,
        config.timeframe,
        config.forecast.lookback
    );

    let app = Application::build(config).await?;
    let handle = app.start().await?;
    info!("Decision loop running. Press Ctrl+C to shutdown.");

    let stop = handle.shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received. Stopping...");
                stop.trigger();
            }
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
    });

    match handle.wait().await {
        Ok(()) => {
            info!("Predictrade stopped.");
            Ok(())
        }
        Err(e) => {
            error!("Predictrade stopped with an error: {:#}", e);
            Err(e)
        }
    }
}
