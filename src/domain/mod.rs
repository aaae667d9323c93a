//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod equity;
pub mod trade;
pub mod drawdown;
pub mod metrics;
pub mod backtest;
pub mod strategy;
pub mod config_validation;
pub mod error;
