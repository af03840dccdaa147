//! Exponential Moving Average.
//!
//! alpha = 2/(span+1), EMA[0] = P[0], then EMA[i] = P[i]*alpha + EMA[i-1]*(1-alpha).
//! No warmup and no bias adjustment: every index is defined.

pub fn calculate_ema(prices: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return Vec::new();
    }

    let alpha = smoothing_factor(span);
    let mut values = Vec::with_capacity(prices.len());
    let mut ema = 0.0;

    for (i, &price) in prices.iter().enumerate() {
        ema = if i == 0 {
            price
        } else {
            price * alpha + ema * (1.0 - alpha)
        };
        values.push(ema);
    }

    values
}

pub fn smoothing_factor(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}
