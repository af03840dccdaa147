//! CSV file adapters: price history input and trade log export.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::error::SignalError;
use crate::domain::position::{ClosedTrade, Side};
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::{HistoryInterval, HistorySource};

pub const TRADE_HEADERS: [&str; 5] = ["Side", "Entry Price", "Exit Price", "PnL (%)", "Time"];
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reads `timestamp,close` rows from a single file.
///
/// Timestamps may be RFC 3339 or unix seconds. The symbol and interval of a
/// request are not checked against the file; `lookback` keeps the newest rows.
pub struct CsvHistorySource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    timestamp: String,
    close: f64,
}

impl CsvHistorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<PricePoint>, SignalError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            SignalError::unavailable(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut points = Vec::new();

        for (line, result) in rdr.deserialize::<HistoryRow>().enumerate() {
            let row = result.map_err(|e| {
                SignalError::unavailable(format!("CSV parse error on row {}: {}", line + 1, e))
            })?;
            let time = parse_timestamp(&row.timestamp).ok_or_else(|| {
                SignalError::unavailable(format!(
                    "invalid timestamp '{}' on row {}",
                    row.timestamp,
                    line + 1
                ))
            })?;
            points.push(PricePoint::new(time, row.close));
        }

        // stable: equal timestamps keep file order
        points.sort_by_key(|p| p.time);
        Ok(PriceSeries::from_points(points)?.points().to_vec())
    }
}

#[async_trait]
impl HistorySource for CsvHistorySource {
    async fn fetch_history(
        &self,
        symbol: &str,
        interval: HistoryInterval,
        lookback: usize,
    ) -> Result<Vec<PricePoint>, SignalError> {
        let mut points = self.load()?;
        let start = points.len().saturating_sub(lookback);
        let points = points.split_off(start);
        tracing::debug!(
            path = %self.path.display(),
            symbol,
            %interval,
            points = points.len(),
            "loaded price history from CSV"
        );
        Ok(points)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// One exported trade, values rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    #[serde(rename = "Side")]
    pub side: String,
    #[serde(rename = "Entry Price")]
    pub entry_price: f64,
    #[serde(rename = "Exit Price")]
    pub exit_price: f64,
    #[serde(rename = "PnL (%)")]
    pub pnl_pct: f64,
    #[serde(rename = "Time")]
    pub time: String,
}

impl TradeRow {
    pub fn from_trade(trade: &ClosedTrade) -> Self {
        Self {
            side: trade.side.to_string(),
            entry_price: round2(trade.entry_price),
            exit_price: round2(trade.exit_price),
            pnl_pct: round2(trade.pnl_pct),
            time: trade.close_time.format(TIME_FORMAT).to_string(),
        }
    }

    pub fn side(&self) -> Result<Side, SignalError> {
        self.side.parse().map_err(|reason| SignalError::Export { reason })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Write `trades` as CSV. The header row is written even when there are no trades.
pub fn write_trades<W: io::Write>(trades: &[ClosedTrade], writer: W) -> Result<(), SignalError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(TRADE_HEADERS)?;
    for trade in trades {
        wtr.serialize(TradeRow::from_trade(trade))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_trades<P: AsRef<Path>>(trades: &[ClosedTrade], path: P) -> Result<(), SignalError> {
    let path = path.as_ref();
    let file = fs::File::create(path).map_err(|e| SignalError::Export {
        reason: format!("failed to create {}: {}", path.display(), e),
    })?;
    write_trades(trades, io::BufWriter::new(file))?;
    tracing::info!(path = %path.display(), trades = trades.len(), "exported trades");
    Ok(())
}

pub fn read_trades<R: io::Read>(reader: R) -> Result<Vec<TradeRow>, SignalError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.iter().ne(TRADE_HEADERS) {
        return Err(SignalError::Export {
            reason: format!("unexpected trade CSV header: {:?}", headers),
        });
    }
    rdr.deserialize()
        .map(|row| row.map_err(SignalError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::ExitReason;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample_trade() -> ClosedTrade {
        ClosedTrade {
            side: Side::Buy,
            entry_price: 100.0,
            exit_price: 102.346,
            pnl_pct: 2.346,
            close_reason: ExitReason::TakeProfit,
            open_time: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            close_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
        }
    }

    fn write_history(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("btc.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_mixed_timestamps_sorted() {
        let (_dir, path) = write_history(
            "timestamp,close\n\
             1704070800,101.5\n\
             2024-01-01T00:00:00Z,100.0\n\
             2024-01-01T02:00:00+00:00,102.0\n",
        );
        let points = CsvHistorySource::new(path).load().unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].price, 100.0);
        assert_eq!(points[1].price, 101.5);
        assert_eq!(points[2].price, 102.0);
        assert!(points.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn load_rejects_bad_rows() {
        let (_dir, path) = write_history("timestamp,close\nyesterday,100.0\n");
        let err = CsvHistorySource::new(path).load().unwrap_err();
        assert!(matches!(err, SignalError::DataUnavailable { .. }));

        let (_dir, path) = write_history("timestamp,close\n1704067200,-3.0\n");
        let err = CsvHistorySource::new(path).load().unwrap_err();
        assert!(matches!(err, SignalError::DataUnavailable { .. }));
    }

    #[test]
    fn load_missing_file_is_unavailable() {
        let err = CsvHistorySource::new("/nonexistent/prices.csv")
            .load()
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn fetch_history_keeps_newest_lookback_points() {
        let (_dir, path) = write_history(
            "timestamp,close\n1704067200,1.0\n1704070800,2.0\n1704074400,3.0\n",
        );
        let source = CsvHistorySource::new(path);
        let points = source
            .fetch_history("BTC", HistoryInterval::Hour, 2)
            .await
            .unwrap();
        assert_eq!(points.iter().map(|p| p.price).collect::<Vec<_>>(), vec![2.0, 3.0]);
    }

    #[test]
    fn trade_row_rounds_and_formats() {
        let row = TradeRow::from_trade(&sample_trade());
        assert_eq!(row.side, "BUY");
        assert_eq!(row.entry_price, 100.0);
        assert_eq!(row.exit_price, 102.35);
        assert_eq!(row.pnl_pct, 2.35);
        assert_eq!(row.time, "2024-03-01 12:30:05");
    }

    #[test]
    fn write_trades_has_exact_header() {
        let mut buf = Vec::new();
        write_trades(&[sample_trade()], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Side,Entry Price,Exit Price,PnL (%),Time"));
        assert_eq!(lines.next(), Some("BUY,100.0,102.35,2.35,2024-03-01 12:30:05"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_log_writes_header_only() {
        let mut buf = Vec::new();
        write_trades(&[], &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Side,Entry Price,Exit Price,PnL (%),Time\n"
        );
    }

    #[test]
    fn read_trades_parses_exported_rows() {
        let mut buf = Vec::new();
        write_trades(&[sample_trade()], &mut buf).unwrap();
        let rows = read_trades(buf.as_slice()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].side().unwrap(), Side::Buy);
        assert!((rows[0].pnl_pct - sample_trade().pnl_pct).abs() <= 0.005 + 1e-9);
    }

    #[test]
    fn read_trades_rejects_foreign_header() {
        let err = read_trades("date,close\n2024-01-01,1.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SignalError::Export { .. }));
    }

    #[test]
    fn export_trades_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        export_trades(&[sample_trade(), sample_trade()], &path).unwrap();

        let rows = read_trades(fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
