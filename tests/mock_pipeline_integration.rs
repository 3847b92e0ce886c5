//! End-to-end run on simulated prices with the real scaler, windowing and
//! smartcore models. No network access.

use predictrade::application::ml::{Forecaster, ModelKind, build_model};
use predictrade::application::system::Application;
use predictrade::config::{
    BinanceConfig, Config, ExecutionMode, ForecastEnvConfig, Mode, ObservabilityEnvConfig,
    ScheduleEnvConfig,
};
use predictrade::domain::market::timeframe::Timeframe;
use predictrade::domain::ports::MarketDataService;
use predictrade::infrastructure::mock::{MockMarketDataService, PaperExecutionService};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;

fn mock_config(model_kind: ModelKind) -> Config {
    Config {
        mode: Mode::Mock,
        execution_mode: ExecutionMode::Paper,
        symbol: "BTC/USDT".to_string(),
        timeframe: Timeframe::OneHour,
        binance: BinanceConfig::default(),
        forecast: ForecastEnvConfig {
            lookback: 12,
            training_size: 300,
            prediction_window: 12,
            decision_threshold: 0.01,
            order_quantity: dec!(0.001),
            model_kind,
            ..Default::default()
        },
        schedule: ScheduleEnvConfig {
            cycle_interval_secs: 3600,
            retry_interval_secs: 1,
            ..Default::default()
        },
        observability: ObservabilityEnvConfig {
            enabled: false,
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn test_application_runs_a_cycle_and_stops_on_shutdown() {
    let config = mock_config(ModelKind::Linear);
    assert_ok!(config.validate());

    let market = Arc::new(MockMarketDataService::new(21));
    let execution = Arc::new(PaperExecutionService::new(dec!(0.001)));
    let app = assert_ok!(Application::with_services(
        config,
        market,
        execution.clone()
    ));
    let handle = assert_ok!(app.start().await);

    let mut cycles = 0.0;
    for _ in 0..500 {
        cycles = handle
            .metrics
            .counter(&handle.metrics.cycles_total, "success");
        if cycles >= 1.0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(cycles, 1.0);
    assert!(handle.forecaster.read().await.is_trained());
    assert_eq!(handle.metrics.training_samples.get(), 288.0);

    let decisions: f64 = ["buy", "sell", "hold"]
        .iter()
        .map(|d| handle.metrics.counter(&handle.metrics.decisions_total, d))
        .sum();
    assert_eq!(decisions, 1.0);
    // Paper fills only exist for actionable decisions.
    let fills = execution.fills().await;
    assert!(fills.len() <= 1);

    handle.shutdown();
    assert_ok!(
        tokio::time::timeout(Duration::from_secs(2), handle.wait())
            .await
            .expect("loop should stop promptly")
    );
}

#[tokio::test]
async fn test_random_forest_prediction_stays_in_price_range() {
    let market = MockMarketDataService::new(8);
    let series = assert_ok!(
        market
            .fetch_recent_candles("ETH/USDT", Timeframe::OneHour, 400)
            .await
    );
    let closes = series.closes();

    let model = build_model(ModelKind::RandomForest, Default::default());
    let mut forecaster = Forecaster::new(model, 20);
    assert_ok!(forecaster.train(&closes));

    let predicted = assert_ok!(forecaster.predict_next(&closes[closes.len() - 20..]));

    let min = closes.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    // Tree ensembles average training targets, so they cannot leave the fitted range.
    assert!(predicted >= min - 1e-9 && predicted <= max + 1e-9);
}
