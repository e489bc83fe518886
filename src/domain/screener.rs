//! Watchlist screener: one row of last-bar indicator readings per symbol.

use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::DeskError;
use super::indicator::{
    average_true_range, exponential_moving_average, rsi, DEFAULT_ATR_WINDOW, DEFAULT_RSI_WINDOW,
};
use super::price_bar::{normalize_symbol, PriceBar};
use crate::ports::cache_port::{CacheExt, CachePort};
use crate::ports::price_port::PricePort;

pub const SCREENER_EMA_WINDOW: usize = 20;

pub fn default_watchlist() -> Vec<String> {
    ["AAPL", "MSFT", "GOOGL", "TSLA", "AMZN", "NVDA", "META"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Upper-cased, deduplicated symbols in their original order.
pub fn parse_watchlist(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(normalize_symbol) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerRow {
    pub symbol: String,
    pub close: f64,
    pub rsi: f64,
    pub ema20: f64,
    pub atr: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Readings on the last bar, rounded to cents. `None` for an empty series or
/// one whose last reading is not finite.
pub fn screen_symbol(symbol: &str, bars: &[PriceBar]) -> Option<ScreenerRow> {
    let last = bars.last()?;
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let row = ScreenerRow {
        symbol: symbol.to_string(),
        close: round2(last.close),
        rsi: round2(*rsi(&close, DEFAULT_RSI_WINDOW).last()?),
        ema20: round2(*exponential_moving_average(&close, SCREENER_EMA_WINDOW).last()?),
        atr: round2(*average_true_range(&high, &low, &close, DEFAULT_ATR_WINDOW).last()?),
    };
    [row.close, row.rsi, row.ema20, row.atr]
        .iter()
        .all(|v| v.is_finite())
        .then_some(row)
}

/// Screen every symbol. Symbols whose fetch fails or returns nothing are
/// left out of the table.
pub fn screen_watchlist(prices: &dyn PricePort, symbols: &[String], days: usize) -> Vec<ScreenerRow> {
    symbols
        .iter()
        .filter_map(|symbol| match prices.fetch(symbol, days) {
            Ok(bars) => screen_symbol(symbol, &bars),
            Err(e) => {
                warn!("screener: skipping {symbol}: {e}");
                None
            }
        })
        .collect()
}

pub fn screener_cache_key(symbols: &[String], days: usize) -> String {
    let mut sorted = symbols.to_vec();
    sorted.sort();
    format!("screener:{}:{days}", sorted.join("|"))
}

/// [`screen_watchlist`] memoised in the cache for `ttl`.
///
/// A cache that cannot be read or written is bypassed with a warning.
pub fn cached_screen(
    cache: &dyn CachePort,
    prices: &dyn PricePort,
    symbols: &[String],
    days: usize,
    ttl: Option<Duration>,
) -> Result<Vec<ScreenerRow>, DeskError> {
    let key = screener_cache_key(symbols, days);
    match cache.get_json::<Vec<ScreenerRow>>(&key) {
        Ok(Some(rows)) => return Ok(rows),
        Ok(None) => {}
        Err(e) => warn!("screener cache read failed for {key}: {e}"),
    }

    let rows = screen_watchlist(prices, symbols, days);
    if let Err(e) = cache.set_json(&key, &rows, ttl) {
        warn!("screener cache write failed for {key}: {e}");
    }
    Ok(rows)
}
