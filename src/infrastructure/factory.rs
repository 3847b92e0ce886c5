use crate::config::{Config, ExecutionMode, Mode};
use crate::domain::ports::{ExecutionService, MarketDataService};
use crate::infrastructure::binance::{BinanceExecutionService, BinanceMarketDataService};
use crate::infrastructure::mock::{MockMarketDataService, PaperExecutionService};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ServiceFactory;

impl ServiceFactory {
    /// Market data follows `MODE`, order routing follows `EXECUTION_MODE`.
    ///
    /// Expects a config that passed `Config::validate`, so live execution
    /// always comes with Binance credentials.
    pub fn create_services(
        config: &Config,
    ) -> (Arc<dyn MarketDataService>, Arc<dyn ExecutionService>) {
        let request_timeout = config.schedule.fetch_timeout();

        let market_service: Arc<dyn MarketDataService> = match config.mode {
            Mode::Mock => {
                info!("ServiceFactory: Using simulated market data");
                Arc::new(MockMarketDataService::default())
            }
            Mode::Binance => {
                info!(
                    "ServiceFactory: Using Binance market data at {}",
                    config.binance.base_url
                );
                Arc::new(BinanceMarketDataService::new(
                    config.binance.base_url.clone(),
                    request_timeout,
                ))
            }
        };

        let execution_service: Arc<dyn ExecutionService> = match config.execution_mode {
            ExecutionMode::Paper => {
                info!("ServiceFactory: Paper execution, no orders will be sent");
                Arc::new(PaperExecutionService::new(config.forecast.order_quantity))
            }
            ExecutionMode::Live => {
                warn!(
                    "ServiceFactory: LIVE execution enabled, orders of {} {} will be sent to Binance",
                    config.forecast.order_quantity, config.symbol
                );
                Arc::new(BinanceExecutionService::new(
                    config.binance.api_key.clone(),
                    config.binance.secret_key.clone(),
                    config.binance.base_url.clone(),
                    config.forecast.order_quantity,
                    config.schedule.execution_timeout(),
                ))
            }
        };

        (market_service, execution_service)
    }
}
