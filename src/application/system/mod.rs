use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub mod shutdown_service;

use crate::application::ml::{Forecaster, SharedForecaster, build_model};
use crate::application::system::shutdown_service::{ShutdownTrigger, shutdown_channel};
use crate::application::trading_loop::{CycleError, TradingLoop};
use crate::config::Config;
use crate::domain::ports::{ExecutionService, MarketDataService};
use crate::domain::trading::decision::DecisionPolicy;
use crate::infrastructure::ServiceFactory;
use crate::infrastructure::observability::{Metrics, MetricsObserver, MetricsReporter};

/// Running system: the decision loop task plus its shutdown switch.
pub struct SystemHandle {
    pub shutdown: ShutdownTrigger,
    pub metrics: Metrics,
    pub forecaster: SharedForecaster,
    loop_task: JoinHandle<Result<(), CycleError>>,
    reporter_task: Option<JoinHandle<()>>,
}

impl SystemHandle {
    /// Asks the loop (and reporter) to stop at the next opportunity.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Waits for the loop to finish; the error that stopped it, if any.
    pub async fn wait(self) -> Result<()> {
        let outcome = self.loop_task.await.context("Trading loop task panicked")?;

        // The reporter has nothing left to report once the loop is gone.
        self.shutdown.trigger();
        if let Some(reporter) = self.reporter_task {
            let _ = reporter.await;
        }

        outcome.context("Trading loop stopped with an error")
    }
}

pub struct Application {
    config: Config,
    market_service: Arc<dyn MarketDataService>,
    execution_service: Arc<dyn ExecutionService>,
    forecaster: SharedForecaster,
    metrics: Metrics,
}

impl Application {
    /// Validates the config and wires services for the configured mode.
    pub async fn build(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let (market_service, execution_service) = ServiceFactory::create_services(&config);
        Self::with_services(config, market_service, execution_service)
    }

    /// Same as [`Application::build`] with caller-supplied adapters.
    pub fn with_services(
        config: Config,
        market_service: Arc<dyn MarketDataService>,
        execution_service: Arc<dyn ExecutionService>,
    ) -> Result<Self> {
        info!(
            "Building Predictrade Application (Mode: {:?}, Execution: {:?}, Model: {:?})...",
            config.mode, config.execution_mode, config.forecast.model_kind
        );

        let model = build_model(config.forecast.model_kind, config.forecast.forest);
        let forecaster = Forecaster::new(model, config.forecast.lookback).into_shared();

        Ok(Self {
            config,
            market_service,
            execution_service,
            forecaster,
            metrics: Metrics::new()?,
        })
    }

    /// Spawns the decision loop and, when enabled, the metrics reporter.
    pub async fn start(self) -> Result<SystemHandle> {
        let (trigger, signal) = shutdown_channel();

        let trading_loop = TradingLoop::new(
            self.config.trading_loop_config(),
            self.market_service.clone(),
            self.execution_service.clone(),
            self.forecaster.clone(),
            DecisionPolicy::new(self.config.forecast.decision_threshold),
            Arc::new(MetricsObserver::new(self.metrics.clone())),
            signal.clone(),
        );

        info!(
            "Starting decision loop for {} on {} candles...",
            self.config.symbol, self.config.timeframe
        );
        let loop_task = tokio::spawn(async move { trading_loop.run().await });

        let reporter_task = if self.config.observability.enabled {
            let reporter = MetricsReporter::new(
                self.metrics.clone(),
                self.config.symbol.clone(),
                self.config.observability.interval_secs,
                signal,
            );
            info!(
                "Metrics reporter started (interval: {}s)",
                self.config.observability.interval_secs
            );
            Some(tokio::spawn(reporter.run()))
        } else {
            info!("Metrics reporting disabled.");
            None
        };

        Ok(SystemHandle {
            shutdown: trigger,
            metrics: self.metrics,
            forecaster: self.forecaster,
            loop_task,
            reporter_task,
        })
    }
}
