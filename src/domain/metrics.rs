//! Trade statistics over closed trades.

use super::position::ClosedTrade;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    /// Sum of per-trade percent P&L.
    pub total_pnl_pct: f64,
    /// Percentage (0-100) of trades with positive P&L.
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub largest_win_pct: f64,
    pub largest_loss_pct: f64,
    /// Mean holding time in seconds.
    pub avg_holding_secs: f64,
}

impl TradeStats {
    pub fn compute(trades: &[ClosedTrade]) -> Self {
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_pnl_pct = 0.0_f64;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win_pct = 0.0_f64;
        let mut largest_loss_pct = 0.0_f64;
        let mut total_holding_secs = 0i64;

        for trade in trades {
            let pnl = trade.pnl_pct;
            total_pnl_pct += pnl;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win_pct = largest_win_pct.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss_pct = largest_loss_pct.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
            total_holding_secs += trade.holding_time().num_seconds();
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win_pct = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss_pct = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_holding_secs = if total_trades > 0 {
            total_holding_secs as f64 / total_trades as f64
        } else {
            0.0
        };

        TradeStats {
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            total_pnl_pct,
            win_rate,
            profit_factor,
            avg_win_pct,
            avg_loss_pct,
            largest_win_pct,
            largest_loss_pct,
            avg_holding_secs,
        }
    }
}
