//! Core domain types and logic.

pub mod error;
pub mod price;
pub mod indicator;
pub mod signal;
pub mod position;
pub mod tracker;
pub mod trade_log;
pub mod metrics;
pub mod backtest;
pub mod session;
pub mod config_validation;
