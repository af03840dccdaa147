//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9. The EMAs are seeded by the
//! first value, so every index carries a value.

use crate::domain::indicator::ema::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn calculate_macd(
    prices: &[f64],
    fast: usize,
    slow: usize,
    signal_span: usize,
) -> Vec<MacdPoint> {
    if prices.is_empty() || fast == 0 || slow == 0 || signal_span == 0 {
        return Vec::new();
    }

    let ema_fast = calculate_ema(prices, fast);
    let ema_slow = calculate_ema(prices, slow);
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal = calculate_ema(&line, signal_span);

    line.iter()
        .zip(&signal)
        .map(|(&line, &signal)| MacdPoint {
            line,
            signal,
            histogram: line - signal,
        })
        .collect()
}
