//! Configuration validation.
//!
//! Reads every section the engine needs, rejects out-of-range values, and
//! builds the typed configs. Nothing runs until this succeeds.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SignalError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::session::LiveConfig;
use crate::domain::tracker::FlipPolicy;
use crate::ports::config_port::{parse_flag, ConfigPort};
use crate::ports::data_port::HistoryInterval;

pub const DEFAULT_SYMBOL: &str = "BTC";
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_LOOKBACK: usize = 168;

/// Where prices come from.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub symbol: String,
    pub currency: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

/// Which slice of history a backtest replays.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub interval: HistoryInterval,
    pub lookback: usize,
}

pub fn build_live_config(config: &dyn ConfigPort) -> Result<LiveConfig, SignalError> {
    let (short_window, long_window) = read_windows(config)?;
    let (stop_loss_pct, take_profit_pct) = read_thresholds(config)?;
    let refresh_secs = read_positive_int(config, "live", "refresh_rate", 10)? as u64;

    let flip_policy = match config.get_string("live", "flip_policy") {
        Some(s) => s
            .parse::<FlipPolicy>()
            .map_err(|reason| SignalError::invalid("live", "flip_policy", reason))?,
        None => FlipPolicy::default(),
    };

    let live = LiveConfig {
        short_window,
        long_window,
        refresh_secs,
        stop_loss_pct,
        take_profit_pct,
        auto_trade: read_bool(config, "live", "auto_trade", false)?,
        flip_policy,
        indicators: read_indicator_params(config)?,
    };
    live.validate()?;
    Ok(live)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SignalError> {
    let (short_window, long_window) = read_windows(config)?;
    let (stop_loss_pct, take_profit_pct) = read_thresholds(config)?;

    let backtest = BacktestConfig {
        short_window,
        long_window,
        stop_loss_pct,
        take_profit_pct,
        mark_to_market: read_bool(config, "backtest", "mark_to_market", false)?,
    };
    backtest.validate()?;
    Ok(backtest)
}

pub fn build_feed_config(config: &dyn ConfigPort) -> Result<FeedConfig, SignalError> {
    let symbol = config
        .get_string("feed", "symbol")
        .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
    if symbol.trim().is_empty() {
        return Err(SignalError::invalid("feed", "symbol", "symbol must not be empty"));
    }
    let currency = config
        .get_string("feed", "currency")
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    if currency.trim().is_empty() {
        return Err(SignalError::invalid("feed", "currency", "currency must not be empty"));
    }

    Ok(FeedConfig {
        symbol: symbol.trim().to_ascii_uppercase(),
        currency: currency.trim().to_ascii_uppercase(),
        base_url: config
            .get_string("feed", "base_url")
            .filter(|s| !s.trim().is_empty()),
        timeout_secs: read_positive_int(
            config,
            "feed",
            "timeout_secs",
            DEFAULT_TIMEOUT_SECS as i64,
        )? as u64,
    })
}

pub fn build_history_query(config: &dyn ConfigPort) -> Result<HistoryQuery, SignalError> {
    let interval = match config.get_string("backtest", "interval") {
        Some(s) => s
            .parse::<HistoryInterval>()
            .map_err(|reason| SignalError::invalid("backtest", "interval", reason))?,
        None => HistoryInterval::Hour,
    };
    let lookback = read_positive_int(config, "backtest", "lookback", DEFAULT_LOOKBACK as i64)?;
    Ok(HistoryQuery {
        interval,
        lookback: lookback as usize,
    })
}

fn read_windows(config: &dyn ConfigPort) -> Result<(usize, usize), SignalError> {
    let short_window = read_positive_int(config, "signal", "short_window", 5)?;
    let long_window = read_positive_int(config, "signal", "long_window", 15)?;
    Ok((short_window as usize, long_window as usize))
}

fn read_thresholds(config: &dyn ConfigPort) -> Result<(f64, f64), SignalError> {
    Ok((
        read_positive_float(config, "risk", "stop_loss_pct", 1.0)?,
        read_positive_float(config, "risk", "take_profit_pct", 2.0)?,
    ))
}

fn read_indicator_params(config: &dyn ConfigPort) -> Result<IndicatorParams, SignalError> {
    let defaults = IndicatorParams::default();
    let params = IndicatorParams {
        rsi_window: read_positive_int(
            config,
            "indicators",
            "rsi_window",
            defaults.rsi_window as i64,
        )? as usize,
        macd_fast: read_positive_int(config, "indicators", "macd_fast", defaults.macd_fast as i64)?
            as usize,
        macd_slow: read_positive_int(config, "indicators", "macd_slow", defaults.macd_slow as i64)?
            as usize,
        macd_signal: read_positive_int(
            config,
            "indicators",
            "macd_signal",
            defaults.macd_signal as i64,
        )? as usize,
    };
    if params.macd_fast >= params.macd_slow {
        return Err(SignalError::invalid(
            "indicators",
            "macd_fast",
            "macd_fast must be less than macd_slow",
        ));
    }
    Ok(params)
}

/// An integer >= 1. A key holding a non-integer is rejected, not defaulted.
fn read_positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, SignalError> {
    if config.has_key(section, key) {
        let raw = config.get_string(section, key).unwrap_or_default();
        if raw.trim().parse::<i64>().is_err() {
            return Err(SignalError::invalid(
                section,
                key,
                format!("expected an integer, got '{}'", raw.trim()),
            ));
        }
    }
    let value = config.get_int(section, key, default);
    if value < 1 {
        return Err(SignalError::invalid(section, key, format!("{} must be at least 1", key)));
    }
    Ok(value)
}

/// A finite number > 0. `1,5` or `lots` is an error, never the default.
fn read_positive_float(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SignalError> {
    if let Some(raw) = config.get_string(section, key) {
        if raw.trim().parse::<f64>().is_err() {
            return Err(SignalError::invalid(
                section,
                key,
                format!("expected a number, got '{}'", raw.trim()),
            ));
        }
    }
    let value = config.get_double(section, key, default);
    if !value.is_finite() || value <= 0.0 {
        return Err(SignalError::invalid(
            section,
            key,
            format!("{} must be a positive number", key),
        ));
    }
    Ok(value)
}

fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, SignalError> {
    if let Some(raw) = config.get_string(section, key) {
        if parse_flag(&raw).is_none() {
            return Err(SignalError::invalid(
                section,
                key,
                format!("expected true or false, got '{}'", raw.trim()),
            ));
        }
    }
    Ok(config.get_bool(section, key, default))
}
