//! Concrete adapter implementations for ports.

#[cfg(feature = "live")]
pub mod cryptocompare;
pub mod csv_adapter;
pub mod file_config_adapter;
