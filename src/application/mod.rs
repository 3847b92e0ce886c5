// Forecasting: scaler/windowing pipeline and smartcore models
pub mod ml;

// Process lifecycle: wiring and shutdown
pub mod system;

// The fetch -> predict -> decide -> act loop
pub mod trading_loop;
