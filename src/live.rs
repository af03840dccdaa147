//! Live polling loop.
//!
//! One evaluation cycle per tick of a fixed interval. Shutdown is only
//! observed while waiting for the next tick, so a cycle always completes.

use chrono::Utc;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::domain::indicator::{IndicatorSet, IndicatorType};
use crate::domain::session::{evaluate_cycle, CycleOutcome, LiveConfig, SessionState};
use crate::ports::data_port::PriceSource;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveOptions {
    /// Stop after this many cycles. `None` runs until shutdown.
    pub max_cycles: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveSummary {
    pub cycles: usize,
    pub evaluated: usize,
    pub collecting: usize,
    pub skipped: usize,
}

impl LiveSummary {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Evaluated(_) => self.evaluated += 1,
            CycleOutcome::CollectingData { .. } => self.collecting += 1,
            CycleOutcome::DataUnavailable { .. } => self.skipped += 1,
        }
    }
}

pub async fn run_live<F>(
    source: &dyn PriceSource,
    config: &LiveConfig,
    state: &mut SessionState,
    options: &LiveOptions,
    shutdown: F,
) -> LiveSummary
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(Duration::from_secs(config.refresh_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut summary = LiveSummary::default();
    tracing::info!(
        refresh_secs = config.refresh_secs,
        short_window = config.short_window,
        long_window = config.long_window,
        auto_trade = config.auto_trade,
        "live loop started"
    );

    loop {
        if options.max_cycles.is_some_and(|max| summary.cycles >= max) {
            tracing::info!(cycles = summary.cycles, "cycle limit reached");
            break;
        }

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!(cycles = summary.cycles, "shutdown requested");
                break;
            }
            _ = ticker.tick() => {}
        }

        let fetched = source.fetch_price().await;
        let outcome = evaluate_cycle(state, config, fetched, Utc::now());
        log_outcome(config, &outcome);
        summary.record(&outcome);
    }

    summary
}

/// Labelled indicator values, e.g. `SMA(5)=101.20 SMA(15)=n/a RSI(14)=55.10 MACD(12,26,9)=0.3500`.
struct Readout<'a> {
    config: &'a LiveConfig,
    set: &'a IndicatorSet,
}

impl fmt::Display for Readout<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labelled = [
            (IndicatorType::Sma(self.config.short_window), self.set.short_ma),
            (IndicatorType::Sma(self.config.long_window), self.set.long_ma),
            (self.config.indicators.rsi_type(), self.set.rsi),
        ];
        for (label, value) in labelled {
            match value {
                Some(v) => write!(f, "{}={:.2} ", label, v)?,
                None => write!(f, "{}=n/a ", label)?,
            }
        }
        write!(f, "{}={:.4}", self.config.indicators.macd_type(), self.set.macd)
    }
}

fn log_outcome(config: &LiveConfig, outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::DataUnavailable { reason } => {
            tracing::warn!(%reason, "price fetch failed, skipping cycle");
        }
        CycleOutcome::CollectingData { have, need } => {
            tracing::info!(have, need, "collecting data");
        }
        CycleOutcome::Evaluated(report) => {
            tracing::info!(
                price = report.price,
                signal = %report.signal,
                indicators = %Readout {
                    config,
                    set: &report.indicators,
                },
                "cycle evaluated"
            );
            if let Some(transition) = report.transition.filter(|t| t.is_alert()) {
                tracing::warn!(signal = %transition.to, price = report.price, "signal alert");
            }
            if let Some(action) = &report.bot_action {
                tracing::info!(
                    side = %action.side,
                    price = action.price,
                    outcome = ?action.outcome,
                    "auto-trade"
                );
            }
            if let Some(pnl_pct) = report.unrealized_pct {
                tracing::debug!(pnl_pct, "open position");
            }
            if let Some(trade) = &report.closed {
                tracing::info!(
                    side = %trade.side,
                    entry = trade.entry_price,
                    exit = trade.exit_price,
                    pnl_pct = trade.pnl_pct,
                    reason = %trade.close_reason,
                    "position closed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::SignalError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedSource {
        prices: Mutex<VecDeque<Option<f64>>>,
    }

    impl ScriptedSource {
        fn new(prices: &[Option<f64>]) -> Self {
            Self {
                prices: Mutex::new(prices.iter().copied().collect()),
            }
        }
    }

    #[async_trait]
    impl PriceSource for ScriptedSource {
        async fn fetch_price(&self) -> Result<f64, SignalError> {
            match self.prices.lock().unwrap().pop_front() {
                Some(Some(price)) => Ok(price),
                _ => Err(SignalError::unavailable("scripted failure")),
            }
        }
    }

    fn config() -> LiveConfig {
        LiveConfig {
            short_window: 2,
            long_window: 3,
            ..LiveConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_cycle_limit() {
        let source = ScriptedSource::new(&[Some(100.0); 10]);
        let mut state = SessionState::default();
        let options = LiveOptions {
            max_cycles: Some(5),
        };

        let summary = run_live(&source, &config(), &mut state, &options, std::future::pending()).await;

        assert_eq!(summary.cycles, 5);
        assert_eq!(summary.collecting, 2);
        assert_eq!(summary.evaluated, 3);
        assert_eq!(state.series.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_skips_cycle_without_touching_state() {
        let source = ScriptedSource::new(&[Some(100.0), None, Some(101.0)]);
        let mut state = SessionState::default();
        let options = LiveOptions {
            max_cycles: Some(3),
        };

        let summary = run_live(&source, &config(), &mut state, &options, std::future::pending()).await;

        assert_eq!(summary.skipped, 1);
        assert_eq!(state.series.len(), 2);
    }

    #[test]
    fn readout_labels_each_indicator() {
        let set = IndicatorSet {
            short_ma: Some(101.2),
            long_ma: None,
            rsi: Some(55.1),
            macd: 0.35,
            ..IndicatorSet::default()
        };
        let readout = Readout {
            config: &LiveConfig::default(),
            set: &set,
        };
        assert_eq!(
            readout.to_string(),
            "SMA(5)=101.20 SMA(15)=n/a RSI(14)=55.10 MACD(12,26,9)=0.3500"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_between_ticks() {
        let source = ScriptedSource::new(&[Some(100.0); 10]);
        let mut state = SessionState::default();
        // ticks at 0s, 10s, 20s; shutdown fires at 25s
        let shutdown = tokio::time::sleep(Duration::from_secs(25));

        let summary = run_live(&source, &config(), &mut state, &LiveOptions::default(), shutdown).await;

        assert_eq!(summary.cycles, 3);
        assert_eq!(state.series.len(), 3);
    }
}
