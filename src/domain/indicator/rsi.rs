//! RSI (Relative Strength Index).
//!
//! Uses plain rolling means of the last n price changes (no Wilder smoothing):
//! - gain = mean of positive changes, loss = mean of |negative changes|
//! - RSI = 100 - 100 / (1 + gain / loss)
//! - loss == 0 saturates to 100 (including a flat window)
//!
//! Warmup: the first n bars are undefined since bar 0 has no change.

pub const DEFAULT_WINDOW: usize = 14;

pub fn calculate_rsi(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || prices.len() < 2 {
        return vec![None; prices.len()];
    }

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);
    for pair in prices.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut values = Vec::with_capacity(prices.len());
    values.push(None);

    // change index j corresponds to price index j + 1
    for j in 0..gains.len() {
        if j + 1 < window {
            values.push(None);
            continue;
        }
        let range = j + 1 - window..=j;
        let avg_gain = gains[range.clone()].iter().sum::<f64>() / window as f64;
        let avg_loss = losses[range].iter().sum::<f64>() / window as f64;
        values.push(Some(rsi_from_averages(avg_gain, avg_loss)));
    }

    values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: f64, step: f64, len: usize) -> Vec<f64> {
        (0..len).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn rsi_empty_and_single() {
        assert!(calculate_rsi(&[], 14).is_empty());
        assert_eq!(calculate_rsi(&[100.0], 14), vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices = ramp(100.0, 1.0, 16);
        let values = calculate_rsi(&prices, 14);

        assert_eq!(values.len(), 16);
        for (i, v) in values.iter().enumerate().take(14) {
            assert!(v.is_none(), "index {} should be undefined", i);
        }
        assert!(values[14].is_some());
        assert!(values[15].is_some());
    }

    #[test]
    fn rsi_all_gains_saturates_to_100() {
        let values = calculate_rsi(&ramp(100.0, 1.0, 20), 14);
        for v in values.into_iter().flatten() {
            assert!((v - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let values = calculate_rsi(&ramp(100.0, -1.0, 20), 14);
        for v in values.into_iter().flatten() {
            assert!(v.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn rsi_flat_window_saturates_instead_of_nan() {
        let values = calculate_rsi(&[50.0; 6], 3);
        assert_eq!(values[3], Some(100.0));
        assert_eq!(values[5], Some(100.0));
    }

    #[test]
    fn rsi_known_calculation() {
        // changes: +2, -1, +3 -> gain 5/3, loss 1/3, RS 5
        let values = calculate_rsi(&[10.0, 12.0, 11.0, 14.0], 3);
        let expected = 100.0 - 100.0 / 6.0;
        assert!((values[3].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn rsi_uses_only_trailing_window() {
        // a large early loss falls out of the window
        let values = calculate_rsi(&[100.0, 50.0, 51.0, 52.0, 53.0], 3);
        assert!(values[3].unwrap() < 100.0);
        assert_eq!(values[4], Some(100.0));
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + ((i % 7) as f64 - 3.0) * 2.0).collect();
        for v in calculate_rsi(&prices, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
        }
    }

    #[test]
    fn rsi_zero_window() {
        assert_eq!(calculate_rsi(&[1.0, 2.0, 3.0], 0), vec![None, None, None]);
    }
}
