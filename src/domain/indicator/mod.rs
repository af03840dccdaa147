//! Technical indicator implementations.
//!
//! Every indicator is a pure function of the price slice it is given:
//! - `sma`: simple rolling mean, undefined until the window is full
//! - `ema`: exponential smoothing seeded by the first value
//! - `rsi`: rolling-mean RSI, saturating to 100 when there are no losses
//! - `macd`: EMA difference, its signal line and histogram
//!
//! [`compute_indicators`] bundles them into an [`IndicatorFrame`].

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdPoint};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

/// RSI and MACD parameters; moving-average windows live in the signal config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            rsi_window: rsi::DEFAULT_WINDOW,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
        }
    }
}

impl IndicatorParams {
    pub fn rsi_type(&self) -> IndicatorType {
        IndicatorType::Rsi(self.rsi_window)
    }

    pub fn macd_type(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.macd_fast,
            slow: self.macd_slow,
            signal: self.macd_signal,
        }
    }
}

/// Indicator values at a single index. `None` means "not yet available".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSet {
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: f64,
    pub signal_line: f64,
    pub histogram: f64,
}

/// Per-index indicator vectors, all the same length as the input prices.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub short_ma: Vec<Option<f64>>,
    pub long_ma: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<MacdPoint>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<IndicatorSet> {
        let macd = self.macd.get(index)?;
        Some(IndicatorSet {
            short_ma: self.short_ma[index],
            long_ma: self.long_ma[index],
            rsi: self.rsi[index],
            macd: macd.line,
            signal_line: macd.signal,
            histogram: macd.histogram,
        })
    }

    pub fn latest(&self) -> Option<IndicatorSet> {
        self.len().checked_sub(1).and_then(|i| self.at(i))
    }
}

pub fn compute_indicators(
    prices: &[f64],
    short_window: usize,
    long_window: usize,
    params: &IndicatorParams,
) -> IndicatorFrame {
    IndicatorFrame {
        short_ma: calculate_sma(prices, short_window),
        long_ma: calculate_sma(prices, long_window),
        rsi: calculate_rsi(prices, params.rsi_window),
        macd: calculate_macd(prices, params.macd_fast, params.macd_slow, params.macd_signal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(5).to_string(), "SMA(5)");
        assert_eq!(IndicatorParams::default().rsi_type().to_string(), "RSI(14)");
        assert_eq!(IndicatorParams::default().macd_type().to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn frame_vectors_match_input_length() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let frame = compute_indicators(&prices, 5, 15, &IndicatorParams::default());

        assert_eq!(frame.len(), 20);
        assert_eq!(frame.short_ma.len(), 20);
        assert_eq!(frame.long_ma.len(), 20);
        assert_eq!(frame.rsi.len(), 20);
    }

    #[test]
    fn latest_reflects_last_index() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let frame = compute_indicators(&prices, 5, 15, &IndicatorParams::default());
        let set = frame.latest().unwrap();

        // mean(110..=114), mean(100..=114)
        assert!((set.short_ma.unwrap() - 112.0).abs() < 1e-9);
        assert!((set.long_ma.unwrap() - 107.0).abs() < 1e-9);
        assert_eq!(set.rsi, Some(100.0));
        assert!((set.histogram - (set.macd - set.signal_line)).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_prices_give_empty_frame() {
        let frame = compute_indicators(&[], 5, 15, &IndicatorParams::default());
        assert!(frame.is_empty());
        assert!(frame.latest().is_none());
    }

    #[test]
    fn early_indices_have_no_moving_averages() {
        let prices = [100.0, 101.0, 102.0];
        let frame = compute_indicators(&prices, 2, 3, &IndicatorParams::default());

        let first = frame.at(0).unwrap();
        assert_eq!(first.short_ma, None);
        assert_eq!(first.long_ma, None);
        assert_eq!(frame.at(1).unwrap().long_ma, None);
        assert!(frame.at(2).unwrap().long_ma.is_some());
        assert!(frame.at(3).is_none());
    }
}
