//! CryptoCompare HTTP price adapter.
//!
//! Latest price: `GET {base}/data/price?fsym=BTC&tsyms=USD` -> `{"USD": 67012.5}`.
//! History: `GET {base}/data/v2/histohour?fsym=BTC&tsym=USD&limit=168` ->
//! `{"Response": "Success", "Data": {"Data": [{"time": ..., "close": ...}]}}`.
//!
//! Every failure, including timeouts and non-2xx responses, is reported as
//! [`SignalError::DataUnavailable`].

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::domain::config_validation::FeedConfig;
use crate::domain::error::SignalError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::{HistoryInterval, HistorySource, PriceSource};

pub const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com";
/// Largest `limit` the histo endpoints accept.
pub const MAX_HISTORY_LIMIT: usize = 2000;

#[derive(Clone)]
pub struct CryptoCompareClient {
    client: Client,
    base_url: String,
    symbol: String,
    currency: String,
}

impl CryptoCompareClient {
    pub fn new(feed: &FeedConfig) -> Result<Self, SignalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(feed.timeout_secs))
            .user_agent(concat!("crosstrader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SignalError::unavailable(format!("failed to build HTTP client: {}", e)))?;

        let base_url = feed
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            symbol: feed.symbol.clone(),
            currency: feed.currency.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, SignalError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| SignalError::unavailable(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SignalError::unavailable(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SignalError::unavailable(format!("malformed response from {}: {}", url, e)))
    }
}

#[async_trait]
impl PriceSource for CryptoCompareClient {
    async fn fetch_price(&self) -> Result<f64, SignalError> {
        let url = format!("{}/data/price", self.base_url);
        let body = self
            .get_json(
                &url,
                &[("fsym", self.symbol.clone()), ("tsyms", self.currency.clone())],
            )
            .await?;
        let price = parse_price(&body, &self.currency)?;
        tracing::debug!(symbol = %self.symbol, currency = %self.currency, price, "fetched price");
        Ok(price)
    }
}

#[async_trait]
impl HistorySource for CryptoCompareClient {
    async fn fetch_history(
        &self,
        symbol: &str,
        interval: HistoryInterval,
        lookback: usize,
    ) -> Result<Vec<PricePoint>, SignalError> {
        let url = format!("{}/data/v2/histo{}", self.base_url, interval);
        let limit = lookback.clamp(1, MAX_HISTORY_LIMIT);
        let body = self
            .get_json(
                &url,
                &[
                    ("fsym", symbol.to_string()),
                    ("tsym", self.currency.clone()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let mut points = parse_history(body)?;
        let start = points.len().saturating_sub(lookback);
        let points = points.split_off(start);
        tracing::info!(symbol, %interval, points = points.len(), "fetched price history");
        Ok(points)
    }
}

/// Extract the `currency` field of a `/data/price` response.
pub fn parse_price(body: &Value, currency: &str) -> Result<f64, SignalError> {
    if let Some(message) = api_error(body) {
        return Err(SignalError::unavailable(message));
    }
    let price = body
        .get(currency)
        .and_then(Value::as_f64)
        .ok_or_else(|| SignalError::unavailable(format!("response has no numeric '{}' field", currency)))?;
    if !price.is_finite() || price <= 0.0 {
        return Err(SignalError::unavailable(format!("non-positive price {}", price)));
    }
    Ok(price)
}

#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Data")]
    data: HistoData,
}

#[derive(Debug, Deserialize)]
struct HistoData {
    #[serde(rename = "Data")]
    data: Vec<HistoBar>,
}

#[derive(Debug, Deserialize)]
struct HistoBar {
    time: i64,
    close: f64,
}

/// Convert a histo response into points, oldest first.
///
/// Bars with a zero close mark periods without trades and are skipped.
pub fn parse_history(body: Value) -> Result<Vec<PricePoint>, SignalError> {
    if let Some(message) = api_error(&body) {
        return Err(SignalError::unavailable(message));
    }
    let response: HistoResponse = serde_json::from_value(body)
        .map_err(|e| SignalError::unavailable(format!("malformed history payload: {}", e)))?;

    let mut points = Vec::with_capacity(response.data.data.len());
    for bar in response.data.data {
        if bar.close <= 0.0 {
            tracing::debug!(time = bar.time, "skipping empty history bar");
            continue;
        }
        let time = DateTime::from_timestamp(bar.time, 0)
            .ok_or_else(|| SignalError::unavailable(format!("invalid bar time {}", bar.time)))?;
        points.push(PricePoint::new(time, bar.close));
    }
    points.sort_by_key(|p| p.time);
    Ok(points)
}

fn api_error(body: &Value) -> Option<String> {
    match body.get("Response").and_then(Value::as_str) {
        Some("Error") => Some(
            body.get("Message")
                .and_then(Value::as_str)
                .unwrap_or("CryptoCompare returned an error")
                .to_string(),
        ),
        _ => None,
    }
}
