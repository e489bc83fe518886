//! Daily OHLCV price bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Absent when the source has no volume column (indices, FX).
    pub volume: Option<f64>,
}

/// Closing prices of a bar series, in order.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Volumes of a bar series, or `None` when any bar lacks one.
pub fn volumes(bars: &[PriceBar]) -> Option<Vec<f64>> {
    bars.iter().map(|b| b.volume).collect()
}

/// Sort ascending by date and keep the last row for duplicated dates.
///
/// Bars with a non-finite close are dropped.
pub fn normalize_series(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.retain(|b| b.close.is_finite());
    bars.sort_by_key(|b| b.date);

    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

/// Normalise a ticker the way users type it: trimmed, upper case.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: (i32, u32, u32), close: f64, volume: Option<f64>) -> PriceBar {
        PriceBar {
            symbol: "SPY".into(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        }
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let bars = vec![
            bar((2024, 1, 3), 103.0, Some(1.0)),
            bar((2024, 1, 1), 101.0, Some(1.0)),
            bar((2024, 1, 2), 102.0, Some(1.0)),
            bar((2024, 1, 2), 102.5, Some(1.0)),
        ];
        let out = normalize_series(bars);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].close, 101.0);
        assert_eq!(out[1].close, 102.5);
        assert_eq!(out[2].close, 103.0);
        assert!(out.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn normalize_drops_nan_close() {
        let bars = vec![bar((2024, 1, 1), f64::NAN, None), bar((2024, 1, 2), 1.0, None)];
        let out = normalize_series(bars);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn volumes_none_if_any_missing() {
        let bars = vec![bar((2024, 1, 1), 1.0, Some(10.0)), bar((2024, 1, 2), 1.0, None)];
        assert!(volumes(&bars).is_none());

        let bars = vec![bar((2024, 1, 1), 1.0, Some(10.0)), bar((2024, 1, 2), 1.0, Some(5.0))];
        assert_eq!(volumes(&bars), Some(vec![10.0, 5.0]));
    }

    #[test]
    fn symbol_normalization() {
        assert_eq!(normalize_symbol("  aapl "), "AAPL");
    }
}
