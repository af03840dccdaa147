//! Single-position state machine: FLAT -> OPEN -> FLAT.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use super::position::{ClosedTrade, ExitReason, Position, Side};
use super::trade_log::TradeLog;

/// What `open` does when a position on the other side is already held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlipPolicy {
    /// Overwrite the old position without recording it.
    #[default]
    ReplaceSilently,
    /// Close the old position at the new price, log it, then open.
    ForceCloseAndLog,
}

impl fmt::Display for FlipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlipPolicy::ReplaceSilently => write!(f, "replace_silently"),
            FlipPolicy::ForceCloseAndLog => write!(f, "force_close_and_log"),
        }
    }
}

impl FromStr for FlipPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace_silently" => Ok(FlipPolicy::ReplaceSilently),
            "force_close_and_log" => Ok(FlipPolicy::ForceCloseAndLog),
            other => Err(format!(
                "unknown flip policy '{}' (expected replace_silently or force_close_and_log)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Opened,
    /// Same side already held; nothing changed.
    AlreadyOpen,
    /// Opposite side dropped without a trade record.
    Replaced { previous: Position },
    /// Opposite side closed and logged before opening.
    Flipped { closed: ClosedTrade },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionTracker {
    position: Option<Position>,
    flip_policy: FlipPolicy,
}

impl PositionTracker {
    pub fn new(flip_policy: FlipPolicy) -> Self {
        Self {
            position: None,
            flip_policy,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn open(
        &mut self,
        side: Side,
        price: f64,
        time: DateTime<Utc>,
        log: &mut TradeLog,
    ) -> OpenOutcome {
        let new_position = Position {
            side,
            entry_price: price,
            entry_time: time,
        };

        let outcome = match self.position {
            None => OpenOutcome::Opened,
            Some(current) if current.side == side => return OpenOutcome::AlreadyOpen,
            Some(current) => match self.flip_policy {
                FlipPolicy::ReplaceSilently => OpenOutcome::Replaced { previous: current },
                FlipPolicy::ForceCloseAndLog => {
                    let closed = current.close(price, time, ExitReason::Replaced);
                    log.record(closed.clone());
                    OpenOutcome::Flipped { closed }
                }
            },
        };

        tracing::debug!(%side, price, ?outcome, "position opened");
        self.position = Some(new_position);
        outcome
    }

    pub fn unrealized_pct(&self, price: f64) -> Option<f64> {
        self.position.map(|p| p.unrealized_pct(price))
    }

    pub fn check_exit(
        &self,
        price: f64,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Option<ExitReason> {
        self.position
            .and_then(|p| p.check_exit(price, stop_loss_pct, take_profit_pct))
    }

    /// Close the position and log the trade. Returns `None` when already flat.
    pub fn close(
        &mut self,
        exit_price: f64,
        time: DateTime<Utc>,
        reason: ExitReason,
        log: &mut TradeLog,
    ) -> Option<ClosedTrade> {
        let position = self.position.take()?;
        let trade = position.close(exit_price, time, reason);
        tracing::debug!(
            side = %trade.side,
            entry = trade.entry_price,
            exit = trade.exit_price,
            pnl_pct = trade.pnl_pct,
            reason = %reason,
            "position closed"
        );
        log.record(trade.clone());
        Some(trade)
    }

    pub fn manual_close(
        &mut self,
        exit_price: f64,
        time: DateTime<Utc>,
        log: &mut TradeLog,
    ) -> Option<ClosedTrade> {
        self.close(exit_price, time, ExitReason::Manual, log)
    }

    /// Close if the price breaches a stop-loss or take-profit threshold.
    pub fn close_on_threshold(
        &mut self,
        price: f64,
        time: DateTime<Utc>,
        stop_loss_pct: f64,
        take_profit_pct: f64,
        log: &mut TradeLog,
    ) -> Option<ClosedTrade> {
        let reason = self.check_exit(price, stop_loss_pct, take_profit_pct)?;
        self.close(price, time, reason, log)
    }
}
