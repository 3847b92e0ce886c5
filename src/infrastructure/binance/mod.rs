pub mod common;
pub mod execution;
pub mod market_data;

pub use execution::BinanceExecutionService;
pub use market_data::BinanceMarketDataService;
