//! Moving-average crossover classification.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn is_actionable(self) -> bool {
        self != Signal::Hold
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

/// How a pair of moving averages is turned into a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalPolicy {
    /// Compare the current pair only; fires on every tick while crossed.
    Level,
    /// Fire only on the tick where the crossover first becomes true.
    Edge,
}

pub fn classify_level(short_ma: f64, long_ma: f64) -> Signal {
    if short_ma > long_ma {
        Signal::Buy
    } else if short_ma < long_ma {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

pub fn classify_edge(prev_short: f64, prev_long: f64, short_ma: f64, long_ma: f64) -> Signal {
    if short_ma > long_ma && prev_short <= prev_long {
        Signal::Buy
    } else if short_ma < long_ma && prev_short >= prev_long {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Classify index `i` of two moving-average series. Undefined averages give HOLD.
pub fn classify(
    policy: SignalPolicy,
    short_ma: &[Option<f64>],
    long_ma: &[Option<f64>],
    i: usize,
) -> Signal {
    let current = (
        short_ma.get(i).copied().flatten(),
        long_ma.get(i).copied().flatten(),
    );
    let (Some(short), Some(long)) = current else {
        return Signal::Hold;
    };

    match policy {
        SignalPolicy::Level => classify_level(short, long),
        SignalPolicy::Edge => {
            let Some(prev) = i.checked_sub(1) else {
                return Signal::Hold;
            };
            match (short_ma[prev], long_ma[prev]) {
                (Some(prev_short), Some(prev_long)) => {
                    classify_edge(prev_short, prev_long, short, long)
                }
                _ => Signal::Hold,
            }
        }
    }
}

/// A change between consecutive cycles' signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalTransition {
    pub from: Option<Signal>,
    pub to: Signal,
}

impl SignalTransition {
    /// Transitions into BUY or SELL are the ones worth alerting on.
    pub fn is_alert(&self) -> bool {
        self.to.is_actionable()
    }
}

/// Remembers the previous cycle's signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalTracker {
    last: Option<Signal>,
}

impl SignalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Signal> {
        self.last
    }

    pub fn observe(&mut self, signal: Signal) -> Option<SignalTransition> {
        if self.last == Some(signal) {
            return None;
        }
        let transition = SignalTransition {
            from: self.last,
            to: signal,
        };
        self.last = Some(signal);
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn level_cases() {
        assert_eq!(classify_level(101.0, 100.0), Signal::Buy);
        assert_eq!(classify_level(99.0, 100.0), Signal::Sell);
        assert_eq!(classify_level(100.0, 100.0), Signal::Hold);
    }

    #[test]
    fn edge_fires_on_cross_only() {
        assert_eq!(classify_edge(99.0, 100.0, 101.0, 100.0), Signal::Buy);
        assert_eq!(classify_edge(100.0, 100.0, 101.0, 100.0), Signal::Buy);
        assert_eq!(classify_edge(101.0, 100.0, 102.0, 100.0), Signal::Hold);
        assert_eq!(classify_edge(101.0, 100.0, 99.0, 100.0), Signal::Sell);
        assert_eq!(classify_edge(99.0, 100.0, 98.0, 100.0), Signal::Hold);
        assert_eq!(classify_edge(99.0, 100.0, 100.0, 100.0), Signal::Hold);
    }

    #[test]
    fn classify_with_undefined_values_holds() {
        let short = [None, Some(2.0), Some(3.0)];
        let long = [None, None, Some(1.0)];
        assert_eq!(classify(SignalPolicy::Level, &short, &long, 0), Signal::Hold);
        assert_eq!(classify(SignalPolicy::Level, &short, &long, 1), Signal::Hold);
        assert_eq!(classify(SignalPolicy::Level, &short, &long, 2), Signal::Buy);
        // previous long average undefined, so no edge
        assert_eq!(classify(SignalPolicy::Edge, &short, &long, 2), Signal::Hold);
    }

    #[test]
    fn classify_edge_at_index_zero_holds() {
        let short = [Some(2.0)];
        let long = [Some(1.0)];
        assert_eq!(classify(SignalPolicy::Edge, &short, &long, 0), Signal::Hold);
    }

    #[test]
    fn classify_out_of_range_holds() {
        assert_eq!(classify(SignalPolicy::Level, &[], &[], 3), Signal::Hold);
    }

    #[test]
    fn policies_differ_while_crossed() {
        let short = [Some(1.0), Some(3.0), Some(4.0)];
        let long = [Some(2.0), Some(2.0), Some(2.0)];
        assert_eq!(classify(SignalPolicy::Edge, &short, &long, 1), Signal::Buy);
        assert_eq!(classify(SignalPolicy::Edge, &short, &long, 2), Signal::Hold);
        assert_eq!(classify(SignalPolicy::Level, &short, &long, 2), Signal::Buy);
    }

    #[test]
    fn tracker_reports_only_changes() {
        let mut tracker = SignalTracker::new();
        let first = tracker.observe(Signal::Hold).unwrap();
        assert_eq!(first.from, None);
        assert!(!first.is_alert());

        assert!(tracker.observe(Signal::Hold).is_none());

        let to_buy = tracker.observe(Signal::Buy).unwrap();
        assert_eq!(to_buy.from, Some(Signal::Hold));
        assert!(to_buy.is_alert());
        assert!(tracker.observe(Signal::Buy).is_none());
        assert_eq!(tracker.last(), Some(Signal::Buy));
    }

    #[test]
    fn signal_display() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(Signal::Sell.to_string(), "SELL");
        assert_eq!(Signal::Hold.to_string(), "HOLD");
    }

    proptest! {
        #[test]
        fn level_matches_ordering(short in -1e9f64..1e9, long in -1e9f64..1e9) {
            let expected = if short > long {
                Signal::Buy
            } else if short < long {
                Signal::Sell
            } else {
                Signal::Hold
            };
            prop_assert_eq!(classify_level(short, long), expected);
            prop_assert_eq!(classify_level(short, short), Signal::Hold);
        }

        #[test]
        fn edge_buy_fires_once_per_crossing(
            pairs in prop::collection::vec((1.0f64..200.0, 1.0f64..200.0), 2..100)
        ) {
            let short: Vec<Option<f64>> = pairs.iter().map(|p| Some(p.0)).collect();
            let long: Vec<Option<f64>> = pairs.iter().map(|p| Some(p.1)).collect();

            let mut above = pairs[0].0 > pairs[0].1;
            for i in 1..pairs.len() {
                let signal = classify(SignalPolicy::Edge, &short, &long, i);
                let now_above = pairs[i].0 > pairs[i].1;
                if signal == Signal::Buy {
                    prop_assert!(!above, "BUY fired while already above at {}", i);
                }
                above = now_above;
            }
        }
    }
}
