//! crosstrader: moving-average crossover signals for BTC.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. [`live`] drives the polling loop.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod live;
pub mod cli;
