//! Historical replay of the crossover strategy.
//!
//! Signals use the edge policy: a position opens only on the bar where the
//! short average first crosses the long one. Exits are stop-loss/take-profit
//! only, and a bar can both open and be checked for exit.

use chrono::{DateTime, Utc};

use super::error::SignalError;
use super::indicator::calculate_sma;
use super::metrics::TradeStats;
use super::position::{Position, Side};
use super::price::PricePoint;
use super::signal::{classify, SignalPolicy};
use super::trade_log::TradeLog;
use super::tracker::PositionTracker;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    /// Report a position still open at the last bar at that bar's price.
    pub mark_to_market: bool,
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        validate_windows("signal", self.short_window, self.long_window)?;
        validate_thresholds("risk", self.stop_loss_pct, self.take_profit_pct)
    }
}

pub(crate) fn validate_windows(
    section: &str,
    short_window: usize,
    long_window: usize,
) -> Result<(), SignalError> {
    if short_window < 2 {
        return Err(SignalError::invalid(
            section,
            "short_window",
            "short_window must be at least 2",
        ));
    }
    if long_window <= short_window {
        return Err(SignalError::invalid(
            section,
            "long_window",
            "long_window must be greater than short_window",
        ));
    }
    Ok(())
}

pub(crate) fn validate_thresholds(
    section: &str,
    stop_loss_pct: f64,
    take_profit_pct: f64,
) -> Result<(), SignalError> {
    if !(stop_loss_pct.is_finite() && stop_loss_pct > 0.0) {
        return Err(SignalError::invalid(
            section,
            "stop_loss_pct",
            "stop_loss_pct must be positive",
        ));
    }
    if !(take_profit_pct.is_finite() && take_profit_pct > 0.0) {
        return Err(SignalError::invalid(
            section,
            "take_profit_pct",
            "take_profit_pct must be positive",
        ));
    }
    Ok(())
}

/// An open position valued at the final bar; not part of realized stats.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPositionMark {
    pub position: Position,
    pub last_price: f64,
    pub last_time: DateTime<Utc>,
    pub unrealized_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: TradeLog,
    pub stats: TradeStats,
    pub open_position: Option<OpenPositionMark>,
    pub bars: usize,
}

/// Replay `points` in order. The config must already be validated.
pub fn run_backtest(points: &[PricePoint], config: &BacktestConfig) -> BacktestResult {
    let closes: Vec<f64> = points.iter().map(|p| p.price).collect();
    // causal rolling means: index i only sees closes[..=i]
    let short_ma = calculate_sma(&closes, config.short_window);
    let long_ma = calculate_sma(&closes, config.long_window);

    let mut tracker = PositionTracker::default();
    let mut trades = TradeLog::new();

    for (i, bar) in points.iter().enumerate().skip(1) {
        let signal = classify(SignalPolicy::Edge, &short_ma, &long_ma, i);

        if tracker.is_flat() {
            if let Some(side) = Side::from_signal(signal) {
                tracker.open(side, bar.price, bar.time, &mut trades);
                tracing::trace!(bar = i, %side, price = bar.price, "backtest entry");
            }
        }

        if let Some(trade) = tracker.close_on_threshold(
            bar.price,
            bar.time,
            config.stop_loss_pct,
            config.take_profit_pct,
            &mut trades,
        ) {
            tracing::trace!(bar = i, pnl_pct = trade.pnl_pct, reason = %trade.close_reason, "backtest exit");
        }
    }

    let open_position = match (config.mark_to_market, tracker.position(), points.last()) {
        (true, Some(position), Some(last)) => Some(OpenPositionMark {
            position: *position,
            last_price: last.price,
            last_time: last.time,
            unrealized_pct: position.unrealized_pct(last.price),
        }),
        _ => None,
    };

    let stats = TradeStats::compute(trades.trades());
    tracing::debug!(
        bars = points.len(),
        trades = stats.total_trades,
        total_pnl_pct = stats.total_pnl_pct,
        win_rate = stats.win_rate,
        "backtest complete"
    );

    BacktestResult {
        trades,
        stats,
        open_position,
        bars: points.len(),
    }
}
