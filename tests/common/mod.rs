#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use crosstrader::domain::backtest::BacktestConfig;
use crosstrader::domain::error::SignalError;
pub use crosstrader::domain::price::PricePoint;
use crosstrader::domain::session::LiveConfig;
use crosstrader::ports::data_port::{HistoryInterval, HistorySource, PriceSource};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Replays a fixed script of prices; `None` entries and an exhausted script fail.
pub struct MockPriceSource {
    prices: Mutex<VecDeque<Option<f64>>>,
    pub calls: AtomicUsize,
}

impl MockPriceSource {
    pub fn new(prices: &[f64]) -> Self {
        Self::scripted(&prices.iter().copied().map(Some).collect::<Vec<_>>())
    }

    pub fn scripted(prices: &[Option<f64>]) -> Self {
        Self {
            prices: Mutex::new(prices.iter().copied().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_price(&self) -> Result<f64, SignalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.prices.lock().unwrap().pop_front() {
            Some(Some(price)) => Ok(price),
            Some(None) => Err(SignalError::unavailable("mock timeout")),
            None => Err(SignalError::unavailable("mock script exhausted")),
        }
    }
}

pub struct MockHistorySource {
    pub points: Vec<PricePoint>,
    pub error: Option<String>,
}

impl MockHistorySource {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self {
            points,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            points: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl HistorySource for MockHistorySource {
    async fn fetch_history(
        &self,
        _symbol: &str,
        _interval: HistoryInterval,
        lookback: usize,
    ) -> Result<Vec<PricePoint>, SignalError> {
        if let Some(reason) = &self.error {
            return Err(SignalError::unavailable(reason.clone()));
        }
        let start = self.points.len().saturating_sub(lookback);
        Ok(self.points[start..].to_vec())
    }
}

pub fn ts(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(hour)
}

/// Hourly points starting at 2024-01-01T00:00:00Z.
pub fn make_points(prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(ts(i as i64), p))
        .collect()
}

/// `timestamp,close` CSV text for `prices`, unix-second timestamps.
pub fn history_csv(prices: &[f64]) -> String {
    let mut out = String::from("timestamp,close\n");
    for point in make_points(prices) {
        out.push_str(&format!("{},{}\n", point.time.timestamp(), point.price));
    }
    out
}

pub fn sample_backtest_config() -> BacktestConfig {
    BacktestConfig {
        short_window: 2,
        long_window: 3,
        stop_loss_pct: 1.0,
        take_profit_pct: 2.0,
        mark_to_market: false,
    }
}

pub fn sample_live_config() -> LiveConfig {
    LiveConfig {
        short_window: 2,
        long_window: 3,
        refresh_secs: 5,
        ..LiveConfig::default()
    }
}

pub fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
