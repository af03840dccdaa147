//! Price data access port traits.

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::SignalError;
use crate::domain::price::PricePoint;

/// Latest-price source polled once per live cycle.
///
/// Implementations must bound each call with a timeout and report any failure
/// as [`SignalError::DataUnavailable`].
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self) -> Result<f64, SignalError>;
}

/// Historical close prices for backtesting, oldest first.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_history(
        &self,
        symbol: &str,
        interval: HistoryInterval,
        lookback: usize,
    ) -> Result<Vec<PricePoint>, SignalError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryInterval {
    Minute,
    Hour,
    Day,
}


impl fmt::Display for HistoryInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryInterval::Minute => write!(f, "minute"),
            HistoryInterval::Hour => write!(f, "hour"),
            HistoryInterval::Day => write!(f, "day"),
        }
    }
}

impl FromStr for HistoryInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" | "1m" => Ok(HistoryInterval::Minute),
            "hour" | "1h" => Ok(HistoryInterval::Hour),
            "day" | "1d" => Ok(HistoryInterval::Day),
            other => Err(format!(
                "unknown interval '{}' (expected minute, hour or day)",
                other
            )),
        }
    }
}
