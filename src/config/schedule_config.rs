//! Loop cadence and timeout configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Schedule environment configuration (all values in seconds)
#[derive(Debug, Clone)]
pub struct ScheduleEnvConfig {
    pub cycle_interval_secs: u64,
    pub retry_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub model_timeout_secs: u64,
    pub execution_timeout_secs: u64,
}

impl Default for ScheduleEnvConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 3600,
            retry_interval_secs: 60,
            fetch_timeout_secs: 30,
            model_timeout_secs: 600,
            execution_timeout_secs: 30,
        }
    }
}

impl ScheduleEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            cycle_interval_secs: Self::parse_secs("CYCLE_INTERVAL_SECS", 3600)?,
            retry_interval_secs: Self::parse_secs("RETRY_INTERVAL_SECS", 60)?,
            fetch_timeout_secs: Self::parse_secs("FETCH_TIMEOUT_SECS", 30)?,
            model_timeout_secs: Self::parse_secs("MODEL_TIMEOUT_SECS", 600)?,
            execution_timeout_secs: Self::parse_secs("EXECUTION_TIMEOUT_SECS", 30)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let all = [
            ("CYCLE_INTERVAL_SECS", self.cycle_interval_secs),
            ("RETRY_INTERVAL_SECS", self.retry_interval_secs),
            ("FETCH_TIMEOUT_SECS", self.fetch_timeout_secs),
            ("MODEL_TIMEOUT_SECS", self.model_timeout_secs),
            ("EXECUTION_TIMEOUT_SECS", self.execution_timeout_secs),
        ];
        for (key, value) in all {
            if value == 0 {
                anyhow::bail!("{} must be greater than zero", key);
            }
        }
        Ok(())
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }

    fn parse_secs(key: &str, default: u64) -> Result<u64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u64>()
            .context(format!("Failed to parse {}", key))
    }
}
