pub mod backtesting;
pub mod config;
