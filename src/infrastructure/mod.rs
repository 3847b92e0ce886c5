pub mod binance;
pub mod core;
pub mod factory;
pub mod mock;
pub mod observability;

pub use factory::ServiceFactory;
