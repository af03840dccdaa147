//! Simple Moving Average.
//!
//! SMA[i] = mean(P[i-w+1..=i]); undefined while i + 1 < w.
//! Each window is summed on its own so a value never depends on how much
//! history precedes it.

pub fn calculate_sma(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; prices.len()];
    }

    (0..prices.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                let sum: f64 = prices[i + 1 - window..=i].iter().sum();
                Some(sum / window as f64)
            }
        })
        .collect()
}
