//! Live evaluation cycle over caller-owned session state.
//!
//! [`SessionState`] holds everything that persists between ticks. Each call to
//! [`evaluate_cycle`] runs one tick to completion; a failed fetch leaves the
//! state exactly as it was.

use chrono::{DateTime, Utc};

use super::backtest::{validate_thresholds, validate_windows};
use super::error::SignalError;
use super::indicator::{compute_indicators, IndicatorParams, IndicatorSet};
use super::position::{ClosedTrade, Side};
use super::price::{PricePoint, PriceSeries};
use super::signal::{classify, Signal, SignalPolicy, SignalTracker, SignalTransition};
use super::trade_log::TradeLog;
use super::tracker::{FlipPolicy, OpenOutcome, PositionTracker};

pub const MIN_REFRESH_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct LiveConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub refresh_secs: u64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    /// Open positions automatically on BUY/SELL signals.
    pub auto_trade: bool,
    pub flip_policy: FlipPolicy,
    pub indicators: IndicatorParams,
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig {
            short_window: 5,
            long_window: 15,
            refresh_secs: 10,
            stop_loss_pct: 1.0,
            take_profit_pct: 2.0,
            auto_trade: false,
            flip_policy: FlipPolicy::ReplaceSilently,
            indicators: IndicatorParams::default(),
        }
    }
}

impl LiveConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        validate_windows("signal", self.short_window, self.long_window)?;
        validate_thresholds("risk", self.stop_loss_pct, self.take_profit_pct)?;
        if self.refresh_secs < MIN_REFRESH_SECS {
            return Err(SignalError::invalid(
                "live",
                "refresh_rate",
                format!("refresh_rate must be at least {} seconds", MIN_REFRESH_SECS),
            ));
        }
        Ok(())
    }
}

/// A position change made by auto-trading.
#[derive(Debug, Clone, PartialEq)]
pub struct BotAction {
    pub side: Side,
    pub price: f64,
    pub time: DateTime<Utc>,
    pub outcome: OpenOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub series: PriceSeries,
    pub tracker: PositionTracker,
    pub log: TradeLog,
    pub signals: SignalTracker,
    pub last_bot_action: Option<BotAction>,
}

impl SessionState {
    pub fn new(flip_policy: FlipPolicy) -> Self {
        SessionState {
            tracker: PositionTracker::new(flip_policy),
            ..Default::default()
        }
    }

    fn latest_price(&self) -> Result<f64, SignalError> {
        self.series
            .last()
            .map(|p| p.price)
            .ok_or_else(|| SignalError::unavailable("no price recorded yet"))
    }

    /// Open at the latest recorded price.
    pub fn manual_open(
        &mut self,
        side: Side,
        now: DateTime<Utc>,
    ) -> Result<OpenOutcome, SignalError> {
        let price = self.latest_price()?;
        Ok(self.tracker.open(side, price, now, &mut self.log))
    }

    /// Close at the latest recorded price. `Ok(None)` when nothing is open.
    pub fn manual_close(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<ClosedTrade>, SignalError> {
        let price = self.latest_price()?;
        Ok(self.tracker.manual_close(price, now, &mut self.log))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub time: DateTime<Utc>,
    pub price: f64,
    pub indicators: IndicatorSet,
    pub signal: Signal,
    pub transition: Option<SignalTransition>,
    pub bot_action: Option<BotAction>,
    /// P&L of the position still open after this cycle.
    pub unrealized_pct: Option<f64>,
    pub closed: Option<ClosedTrade>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    DataUnavailable { reason: String },
    CollectingData { have: usize, need: usize },
    Evaluated(Box<CycleReport>),
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Evaluated(report) => Some(report.as_ref()),
            _ => None,
        }
    }

    /// The recoverable error behind a skipped or deferred cycle.
    pub fn as_error(&self) -> Option<SignalError> {
        match self {
            CycleOutcome::DataUnavailable { reason } => {
                Some(SignalError::unavailable(reason.clone()))
            }
            CycleOutcome::CollectingData { have, need } => {
                Some(SignalError::InsufficientHistory {
                    have: *have,
                    need: *need,
                })
            }
            CycleOutcome::Evaluated(_) => None,
        }
    }
}

pub fn evaluate_cycle(
    state: &mut SessionState,
    config: &LiveConfig,
    fetched: Result<f64, SignalError>,
    now: DateTime<Utc>,
) -> CycleOutcome {
    let price = match fetched {
        Ok(price) => price,
        Err(err) => {
            return CycleOutcome::DataUnavailable {
                reason: err.to_string(),
            };
        }
    };
    if let Err(err) = state.series.push(PricePoint::new(now, price)) {
        return CycleOutcome::DataUnavailable {
            reason: err.to_string(),
        };
    }

    let have = state.series.len();
    if have < config.long_window {
        return CycleOutcome::CollectingData {
            have,
            need: config.long_window,
        };
    }

    let window = PriceSeries::closes(state.series.tail(config.long_window));
    let frame = compute_indicators(
        &window,
        config.short_window,
        config.long_window,
        &config.indicators,
    );
    let last = window.len() - 1;
    let signal = classify(SignalPolicy::Level, &frame.short_ma, &frame.long_ma, last);
    let transition = state.signals.observe(signal);

    let mut bot_action = None;
    if config.auto_trade {
        if let Some(side) = Side::from_signal(signal) {
            let outcome = state.tracker.open(side, price, now, &mut state.log);
            if outcome != OpenOutcome::AlreadyOpen {
                let action = BotAction {
                    side,
                    price,
                    time: now,
                    outcome,
                };
                state.last_bot_action = Some(action.clone());
                bot_action = Some(action);
            }
        }
    }

    let closed = state.tracker.close_on_threshold(
        price,
        now,
        config.stop_loss_pct,
        config.take_profit_pct,
        &mut state.log,
    );

    CycleOutcome::Evaluated(Box::new(CycleReport {
        time: now,
        price,
        indicators: frame.at(last).unwrap_or_default(),
        signal,
        transition,
        bot_action,
        unrealized_pct: state.tracker.unrealized_pct(price),
        closed,
    }))
}
