//! Positions, exit reasons, and closed trades.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn from_signal(signal: Signal) -> Option<Side> {
        match signal {
            Signal::Buy => Some(Side::Buy),
            Signal::Sell => Some(Side::Sell),
            Signal::Hold => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(format!("unknown side '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Manual,
    /// Closed because the signal flipped to the opposite side.
    Replaced,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "STOP_LOSS"),
            ExitReason::TakeProfit => write!(f, "TAKE_PROFIT"),
            ExitReason::Manual => write!(f, "MANUAL"),
            ExitReason::Replaced => write!(f, "REPLACED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
}

impl Position {
    /// Percent gain of the position at `price`; positive is profit for either side.
    pub fn unrealized_pct(&self, price: f64) -> f64 {
        match self.side {
            Side::Buy => (price - self.entry_price) / self.entry_price * 100.0,
            Side::Sell => (self.entry_price - price) / self.entry_price * 100.0,
        }
    }

    /// Stop-loss wins over take-profit when both would hold.
    pub fn check_exit(
        &self,
        price: f64,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Option<ExitReason> {
        let change = self.unrealized_pct(price);
        if change <= -stop_loss_pct {
            Some(ExitReason::StopLoss)
        } else if change >= take_profit_pct {
            Some(ExitReason::TakeProfit)
        } else {
            None
        }
    }

    pub fn close(
        &self,
        exit_price: f64,
        close_time: DateTime<Utc>,
        reason: ExitReason,
    ) -> ClosedTrade {
        ClosedTrade {
            side: self.side,
            entry_price: self.entry_price,
            exit_price,
            pnl_pct: self.unrealized_pct(exit_price),
            close_reason: reason,
            open_time: self.entry_time,
            close_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl_pct: f64,
    pub close_reason: ExitReason,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
}

impl ClosedTrade {
    pub fn holding_time(&self) -> chrono::Duration {
        self.close_time - self.open_time
    }
}
