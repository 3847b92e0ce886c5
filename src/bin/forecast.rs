//! One-shot dry run: train once, run a single cycle, print the result.
//!
//! Orders are never sent; the decision is routed to paper execution.
//!
//! ```sh
//! MODE=binance cargo run --bin forecast -- --symbol ETH/USDT --training-size 2000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use predictrade::application::ml::{Forecaster, ModelKind, build_model};
use predictrade::application::system::shutdown_service::shutdown_channel;
use predictrade::application::trading_loop::{LogObserver, TradingLoop};
use predictrade::config::{Config, ExecutionMode};
use predictrade::domain::market::timeframe::Timeframe;
use predictrade::domain::trading::decision::DecisionPolicy;
use predictrade::infrastructure::ServiceFactory;
use predictrade::infrastructure::mock::PaperExecutionService;
use std::sync::Arc;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trading pair, e.g. BTC/USDT (default: SYMBOL)
    #[arg(long)]
    symbol: Option<String>,

    /// Candle timeframe: 1m, 5m, 15m, 1h, 4h, 1d (default: TIMEFRAME)
    #[arg(long)]
    timeframe: Option<Timeframe>,

    /// Candles fetched for training (default: TRAINING_SIZE)
    #[arg(long)]
    training_size: Option<usize>,

    /// Window length fed to the model (default: LOOKBACK)
    #[arg(long)]
    lookback: Option<usize>,

    /// Relative move required to act (default: DECISION_THRESHOLD)
    #[arg(long)]
    threshold: Option<f64>,

    /// random_forest or linear (default: MODEL_KIND)
    #[arg(long)]
    model: Option<ModelKind>,

    /// Print the cycle report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;

    if let Some(symbol) = args.symbol {
        config.symbol = symbol;
    }
    if let Some(timeframe) = args.timeframe {
        config.timeframe = timeframe;
    }
    if let Some(training_size) = args.training_size {
        config.forecast.training_size = training_size;
    }
    if let Some(lookback) = args.lookback {
        config.forecast.lookback = lookback;
        config.forecast.prediction_window = config.forecast.prediction_window.max(lookback);
    }
    if let Some(threshold) = args.threshold {
        config.forecast.decision_threshold = threshold;
    }
    if let Some(model) = args.model {
        config.forecast.model_kind = model;
    }
    // Never place real orders from a dry run.
    config.execution_mode = ExecutionMode::Paper;
    config.validate().context("Invalid configuration")?;

    let (market_service, _) = ServiceFactory::create_services(&config);
    let execution = Arc::new(PaperExecutionService::new(config.forecast.order_quantity));
    let model = build_model(config.forecast.model_kind, config.forecast.forest);
    let forecaster = Forecaster::new(model, config.forecast.lookback).into_shared();
    let (_trigger, signal) = shutdown_channel();

    let trading_loop = TradingLoop::new(
        config.trading_loop_config(),
        market_service,
        execution.clone(),
        forecaster,
        DecisionPolicy::new(config.forecast.decision_threshold),
        Arc::new(LogObserver),
        signal,
    );

    let training = trading_loop.train().await?;
    let report = trading_loop.run_cycle(1).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let change = (report.predicted - report.observed) / report.observed;
        println!("Symbol:      {} ({})", report.symbol, config.timeframe);
        println!(
            "Model:       {:?} on {} windows of {}",
            config.forecast.model_kind, training.samples, config.forecast.lookback
        );
        println!("Observed:    {:.4}", report.observed);
        println!("Predicted:   {:.4} ({:+.3}%)", report.predicted, change * 100.0);
        println!(
            "Threshold:   {:.3}%",
            config.forecast.decision_threshold * 100.0
        );
        println!("Decision:    {}", report.decision);
        for fill in execution.fills().await {
            println!(
                "Paper fill:  {} {} {} (not sent)",
                fill.decision, fill.quantity, fill.symbol
            );
        }
    }

    Ok(())
}
