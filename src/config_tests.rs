use crate::config::{Config, ExecutionMode, LogFormat, Mode};
use crate::domain::market::timeframe::Timeframe;
use rust_decimal_macros::dec;
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Duration;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const KEYS: &[&str] = &[
    "MODE",
    "EXECUTION_MODE",
    "SYMBOL",
    "TIMEFRAME",
    "LOOKBACK",
    "TRAINING_SIZE",
    "PREDICTION_WINDOW",
    "DECISION_THRESHOLD",
    "ORDER_QUANTITY",
    "MODEL_KIND",
    "CYCLE_INTERVAL_SECS",
    "RETRY_INTERVAL_SECS",
    "LOG_FORMAT",
    "BINANCE_API_KEY",
    "BINANCE_SECRET_KEY",
];

fn clear_env() {
    for key in KEYS {
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn test_config_from_env_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    let config = Config::from_env().expect("Should parse with defaults");

    assert_eq!(config.mode, Mode::Mock);
    assert_eq!(config.execution_mode, ExecutionMode::Paper);
    assert_eq!(config.symbol, "BTC/USDT");
    assert_eq!(config.timeframe, Timeframe::OneHour);
    assert_eq!(config.forecast.lookback, 60);
    assert_eq!(config.forecast.training_size, 1000);
    assert_eq!(config.forecast.prediction_window, 60);
    assert_eq!(config.forecast.order_quantity, dec!(0.001));
    assert!(config.validate().is_ok());

    let loop_config = config.trading_loop_config();
    assert_eq!(loop_config.cycle_interval, Duration::from_secs(3600));
    assert_eq!(loop_config.retry_interval, Duration::from_secs(60));
}

#[test]
fn test_prediction_window_follows_lookback() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();
    unsafe {
        env::set_var("LOOKBACK", "24");
        env::set_var("TIMEFRAME", "15m");
        env::set_var("DECISION_THRESHOLD", "0.02");
        env::set_var("LOG_FORMAT", "json");
    }

    let config = Config::from_env().unwrap();

    assert_eq!(config.forecast.lookback, 24);
    assert_eq!(config.forecast.prediction_window, 24);
    assert_eq!(config.timeframe, Timeframe::FifteenMin);
    assert!((config.forecast.decision_threshold - 0.02).abs() < 1e-12);
    assert_eq!(config.observability.log_format, LogFormat::Json);

    clear_env();
}

#[test]
fn test_invalid_values_fail_to_parse() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    unsafe { env::set_var("LOOKBACK", "sixty") };
    let err = Config::from_env().unwrap_err();
    assert!(format!("{:#}", err).contains("LOOKBACK"));

    clear_env();
    unsafe { env::set_var("TIMEFRAME", "2h") };
    assert!(Config::from_env().is_err());

    clear_env();
    unsafe { env::set_var("MODEL_KIND", "lstm") };
    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
fn test_validate_cross_field_rules() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    unsafe {
        env::set_var("LOOKBACK", "100");
        env::set_var("TRAINING_SIZE", "100");
    }
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_err());

    clear_env();
    unsafe { env::set_var("CYCLE_INTERVAL_SECS", "0") };
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_err());

    clear_env();
}

#[test]
fn test_live_execution_requires_binance_credentials() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    unsafe { env::set_var("EXECUTION_MODE", "live") };
    let config = Config::from_env().unwrap();
    // Mock market data cannot back live orders.
    assert!(config.validate().is_err());

    unsafe { env::set_var("MODE", "binance") };
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_err());

    unsafe {
        env::set_var("BINANCE_API_KEY", "key");
        env::set_var("BINANCE_SECRET_KEY", "secret");
    }
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_ok());

    clear_env();
}
