//! Prediction-driven decision loop.
//!
//! Trains the forecaster once, then repeats fetch -> predict -> decide -> act
//! until shutdown. Each cycle starts from scratch: a transient failure anywhere
//! in it is reported, followed by the short retry interval, and the next
//! attempt begins again with the candle fetch. Programming-sequence errors
//! (e.g. predicting with an untrained model) end the loop.

pub mod error;
pub mod observer;

pub use error::{CycleError, Stage};
pub use observer::{CycleObserver, CycleReport, LogObserver, TrainingReport};

use crate::application::ml::forecaster::{SharedForecaster, TrainedForecast};
use crate::application::system::shutdown_service::{ShutdownSignal, Wake};
use crate::domain::errors::{ForecastError, MarketDataError};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{ExecutionService, MarketDataService};
use crate::domain::trading::decision::DecisionPolicy;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Scheduling and sizing parameters for the loop
#[derive(Debug, Clone)]
pub struct TradingLoopConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Candles fetched once for training.
    pub training_size: usize,
    /// Candles fetched every cycle; at least the forecaster's lookback.
    pub prediction_window: usize,
    /// Pause after a successful cycle.
    pub cycle_interval: Duration,
    /// Pause after a failed cycle.
    pub retry_interval: Duration,
    pub fetch_timeout: Duration,
    pub model_timeout: Duration,
    pub execution_timeout: Duration,
}

impl TradingLoopConfig {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            training_size: 1000,
            prediction_window: 60,
            cycle_interval: Duration::from_secs(3600),
            retry_interval: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(30),
            model_timeout: Duration::from_secs(600),
            execution_timeout: Duration::from_secs(30),
        }
    }
}

pub struct TradingLoop {
    config: TradingLoopConfig,
    market_service: Arc<dyn MarketDataService>,
    execution_service: Arc<dyn ExecutionService>,
    forecaster: SharedForecaster,
    policy: DecisionPolicy,
    observer: Arc<dyn CycleObserver>,
    shutdown: ShutdownSignal,
}

impl TradingLoop {
    pub fn new(
        config: TradingLoopConfig,
        market_service: Arc<dyn MarketDataService>,
        execution_service: Arc<dyn ExecutionService>,
        forecaster: SharedForecaster,
        policy: DecisionPolicy,
        observer: Arc<dyn CycleObserver>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            config,
            market_service,
            execution_service,
            forecaster,
            policy,
            observer,
            shutdown,
        }
    }

    /// Trains if needed, then cycles until shutdown.
    ///
    /// Returns `Ok(())` on shutdown and the error that stopped the loop otherwise.
    /// A failed training run is returned as-is; restarting is left to the caller.
    pub async fn run(&self) -> Result<(), CycleError> {
        let needs_training = !self.forecaster.read().await.is_trained();
        if needs_training {
            match self.train().await {
                Ok(_) => {}
                Err(CycleError::Cancelled) => {
                    info!("TradingLoop: Shutdown during training");
                    return Ok(());
                }
                Err(e) => {
                    error!("TradingLoop: Training failed, giving up: {}", e);
                    return Err(e);
                }
            }
        }

        let mut cycle: u64 = 0;
        while !self.shutdown.is_triggered() {
            cycle += 1;
            let pause = match self.run_cycle(cycle).await {
                Ok(report) => {
                    self.observer
                        .on_cycle_success(&report, self.config.cycle_interval);
                    self.config.cycle_interval
                }
                Err(CycleError::Cancelled) => break,
                Err(e) if e.is_transient() => {
                    self.observer
                        .on_cycle_failure(cycle, &e, self.config.retry_interval);
                    self.config.retry_interval
                }
                Err(e) => {
                    error!("TradingLoop: Fatal error in cycle {}: {}", cycle, e);
                    return Err(e);
                }
            };

            if self.shutdown.sleep(pause).await == Wake::Shutdown {
                break;
            }
        }

        info!("TradingLoop: Stopped after {} cycles", cycle);
        Ok(())
    }

    /// Fetches the training history and installs a freshly fitted forecast.
    pub async fn train(&self) -> Result<TrainingReport, CycleError> {
        let started = Instant::now();
        let cfg = &self.config;
        info!(
            "TradingLoop: Training on {} x {} candles for {}",
            cfg.training_size, cfg.timeframe, cfg.symbol
        );

        let series = self
            .guard(
                Stage::FetchCandles,
                cfg.fetch_timeout,
                self.market_service
                    .fetch_recent_candles(&cfg.symbol, cfg.timeframe, cfg.training_size),
            )
            .await?;

        let (model, lookback) = {
            let forecaster = self.forecaster.read().await;
            (forecaster.model(), forecaster.lookback())
        };
        let closes = series.closes();
        let trained = self
            .blocking(Stage::Train, move || {
                TrainedForecast::fit(model.as_ref(), &closes, lookback)
            })
            .await?;

        let report = TrainingReport {
            symbol: cfg.symbol.clone(),
            candles: series.len(),
            samples: trained.samples(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.forecaster.write().await.install(trained);
        self.observer.on_training_complete(&report);
        Ok(report)
    }

    /// One fetch -> predict -> decide -> act pass. Never sleeps.
    pub async fn run_cycle(&self, cycle: u64) -> Result<CycleReport, CycleError> {
        let started = Instant::now();
        let cfg = &self.config;

        // Fatal when untrained, so check before touching the network.
        let trained = self.forecaster.read().await.trained()?;

        let series = self
            .guard(
                Stage::FetchCandles,
                cfg.fetch_timeout,
                self.market_service.fetch_recent_candles(
                    &cfg.symbol,
                    cfg.timeframe,
                    cfg.prediction_window,
                ),
            )
            .await?;
        if series.len() < trained.lookback() {
            return Err(MarketDataError::InvalidData {
                symbol: cfg.symbol.clone(),
                reason: format!(
                    "expected at least {} candles, got {}",
                    trained.lookback(),
                    series.len()
                ),
            }
            .into());
        }

        let closes = series.closes();
        let predicted = self
            .blocking(Stage::Predict, move || trained.predict_next(&closes))
            .await?;

        let observed = self
            .guard(
                Stage::FetchPrice,
                cfg.fetch_timeout,
                self.market_service.fetch_current_price(&cfg.symbol),
            )
            .await?;
        if !observed.is_finite() || observed <= 0.0 {
            return Err(MarketDataError::InvalidData {
                symbol: cfg.symbol.clone(),
                reason: format!("unusable current price {}", observed),
            }
            .into());
        }

        let decision = self.policy.decide(predicted, observed);
        debug!(
            "TradingLoop: cycle {} predicted {:.4} vs observed {:.4} -> {}",
            cycle, predicted, observed, decision
        );

        if decision.is_actionable() {
            self.guard(
                Stage::Execute,
                cfg.execution_timeout,
                self.execution_service.execute(decision, &cfg.symbol),
            )
            .await?;
        }

        Ok(CycleReport {
            cycle,
            symbol: cfg.symbol.clone(),
            decision,
            predicted,
            observed,
            executed: decision.is_actionable(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Bounds an external call by `limit` and aborts it on shutdown.
    async fn guard<T, E, F>(&self, stage: Stage, limit: Duration, call: F) -> Result<T, CycleError>
    where
        F: Future<Output = Result<T, E>>,
        CycleError: From<E>,
    {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(CycleError::Cancelled),
            outcome = tokio::time::timeout(limit, call) => match outcome {
                Ok(result) => result.map_err(CycleError::from),
                Err(_) => Err(CycleError::Timeout {
                    stage,
                    duration_ms: limit.as_millis() as u64,
                }),
            },
        }
    }

    /// Runs CPU-bound model work off the async workers, under the model timeout.
    async fn blocking<T, F>(&self, stage: Stage, work: F) -> Result<T, CycleError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ForecastError> + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(work);
        let joined = async move {
            match handle.await {
                Ok(result) => result.map_err(CycleError::from),
                Err(e) => Err(CycleError::Worker {
                    stage,
                    reason: e.to_string(),
                }),
            }
        };
        self.guard(stage, self.config.model_timeout, joined).await
    }
}
