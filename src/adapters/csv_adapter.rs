//! Price history from CSV files, one file per symbol.
//!
//! The expected layout is the daily download format `Date,Open,High,Low,Close,Volume`.
//! Header names are matched case-insensitively. Open, High and Low fall back to
//! Close when missing, and Volume is optional.

use crate::domain::error::DeskError;
use crate::domain::price_bar::{normalize_series, normalize_symbol, PriceBar};
use crate::ports::price_port::{PricePort, MAX_HISTORY_DAYS};
use chrono::NaiveDate;
use log::debug;
use std::io::Read;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

impl PricePort for CsvAdapter {
    fn fetch(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, DeskError> {
        let symbol = normalize_symbol(symbol);
        let path = self.csv_path(&symbol);
        let file = match std::fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("csv: no file for {symbol} at {}", path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(DeskError::data_unavailable(
                    &symbol,
                    format!("failed to read {}: {e}", path.display()),
                ));
            }
        };

        let bars = parse_price_csv(file, &symbol)?;
        Ok(tail(bars, days))
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// Keep the most recent `days` bars, never more than [`MAX_HISTORY_DAYS`].
pub fn tail(mut bars: Vec<PriceBar>, days: usize) -> Vec<PriceBar> {
    let days = days.min(MAX_HISTORY_DAYS);
    if bars.len() > days {
        bars.drain(..bars.len() - days);
    }
    bars
}

struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, symbol: &str) -> Result<Self, DeskError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let missing = |name: &str| {
            DeskError::data_unavailable(symbol, format!("missing {name} column"))
        };
        Ok(Columns {
            date: find("date").ok_or_else(|| missing("Date"))?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            close: find("close").ok_or_else(|| missing("Close"))?,
            volume: find("volume"),
        })
    }
}

fn parse_field(record: &csv::StringRecord, idx: Option<usize>) -> Option<f64> {
    idx.and_then(|i| record.get(i))
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse a daily price CSV into a normalised, date-ordered series.
///
/// Rows with an unparseable date or close are skipped rather than failing the
/// whole file. A body that is not a price table at all (no Date or Close
/// header) is a `DataUnavailable` error.
pub fn parse_price_csv<R: Read>(reader: R, symbol: &str) -> Result<Vec<PriceBar>, DeskError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| DeskError::data_unavailable(symbol, format!("CSV parse error: {e}")))?
        .clone();
    let cols = Columns::from_headers(&headers, symbol)?;

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record =
            result.map_err(|e| DeskError::data_unavailable(symbol, format!("CSV parse error: {e}")))?;

        let date = record
            .get(cols.date)
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok());
        let close = parse_field(&record, Some(cols.close));
        let (Some(date), Some(close)) = (date, close) else {
            skipped += 1;
            continue;
        };

        bars.push(PriceBar {
            symbol: symbol.to_string(),
            date,
            open: parse_field(&record, cols.open).unwrap_or(close),
            high: parse_field(&record, cols.high).unwrap_or(close),
            low: parse_field(&record, cols.low).unwrap_or(close),
            close,
            volume: parse_field(&record, cols.volume),
        });
    }

    if skipped > 0 {
        debug!("{symbol}: skipped {skipped} malformed rows");
    }
    Ok(normalize_series(bars))
}
