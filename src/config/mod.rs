//! Configuration module for Predictrade.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by domain: Broker, Forecast, Schedule, and Observability.

mod broker_config;
mod forecast_config;
mod observability_config;
mod schedule_config;

pub use broker_config::BinanceConfig;
pub use forecast_config::ForecastEnvConfig;
pub use observability_config::{LogFormat, ObservabilityEnvConfig};
pub use schedule_config::ScheduleEnvConfig;

use crate::application::trading_loop::TradingLoopConfig;
use crate::domain::market::timeframe::Timeframe;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Where market data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Mock,
    Binance,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Mode::Mock),
            "binance" => Ok(Mode::Binance),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'mock' or 'binance'", s),
        }
    }
}

/// Whether decisions reach the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Paper,
    Live,
}

impl FromStr for ExecutionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paper" => Ok(ExecutionMode::Paper),
            "live" => Ok(ExecutionMode::Live),
            _ => anyhow::bail!("Invalid EXECUTION_MODE: {}. Must be 'paper' or 'live'", s),
        }
    }
}

/// Main application configuration.
///
/// Aggregates the sub-module configs. Call [`Config::validate`] before wiring
/// services; `from_env` only checks that each value parses.
#[derive(Debug, Clone)]
pub struct Config {
    // Core
    pub mode: Mode,
    pub execution_mode: ExecutionMode,
    pub symbol: String,
    pub timeframe: Timeframe,

    pub binance: BinanceConfig,
    pub forecast: ForecastEnvConfig,
    pub schedule: ScheduleEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let mode_str = env::var("MODE").unwrap_or_else(|_| "mock".to_string());
        let mode = Mode::from_str(&mode_str)?;

        let execution_mode_str =
            env::var("EXECUTION_MODE").unwrap_or_else(|_| "paper".to_string());
        let execution_mode = ExecutionMode::from_str(&execution_mode_str)?;

        let symbol = env::var("SYMBOL").unwrap_or_else(|_| "BTC/USDT".to_string());

        let timeframe_str = env::var("TIMEFRAME").unwrap_or_else(|_| "1h".to_string());
        let timeframe = Timeframe::from_str(&timeframe_str).context("Failed to parse TIMEFRAME")?;

        let forecast = ForecastEnvConfig::from_env().context("Failed to load forecast config")?;
        let schedule = ScheduleEnvConfig::from_env().context("Failed to load schedule config")?;

        Ok(Self {
            mode,
            execution_mode,
            symbol,
            timeframe,
            binance: BinanceConfig::from_env(),
            forecast,
            schedule,
            observability: ObservabilityEnvConfig::from_env(),
        })
    }

    /// Cross-field checks that must hold before the loop starts.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            anyhow::bail!("SYMBOL must not be empty");
        }
        self.forecast
            .validate()
            .context("Invalid forecast config")?;
        self.schedule
            .validate()
            .context("Invalid schedule config")?;

        if self.execution_mode == ExecutionMode::Live {
            if self.mode != Mode::Binance {
                anyhow::bail!("EXECUTION_MODE=live requires MODE=binance");
            }
            if !self.binance.has_credentials() {
                anyhow::bail!(
                    "EXECUTION_MODE=live requires BINANCE_API_KEY and BINANCE_SECRET_KEY"
                );
            }
        }
        Ok(())
    }

    /// Create the loop's scheduling parameters from this Config
    pub fn trading_loop_config(&self) -> TradingLoopConfig {
        TradingLoopConfig {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            training_size: self.forecast.training_size,
            prediction_window: self.forecast.prediction_window,
            cycle_interval: self.schedule.cycle_interval(),
            retry_interval: self.schedule.retry_interval(),
            fetch_timeout: self.schedule.fetch_timeout(),
            model_timeout: self.schedule.model_timeout(),
            execution_timeout: self.schedule.execution_timeout(),
        }
    }
}
