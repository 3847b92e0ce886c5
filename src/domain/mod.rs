// Market data domain
pub mod market;

// Windowing and scaling for the forecaster
pub mod ml;

// Port interfaces
pub mod ports;

// Core trading domain
pub mod trading;

// Domain-specific error types
pub mod errors;
