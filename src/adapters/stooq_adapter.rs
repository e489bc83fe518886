//! Daily history downloaded as CSV from stooq.com.

use std::time::Duration;

use log::debug;

use crate::adapters::csv_adapter::{parse_price_csv, tail};
use crate::domain::error::DeskError;
use crate::domain::price_bar::{normalize_symbol, PriceBar};
use crate::ports::price_port::{PricePort, MAX_HISTORY_DAYS};

pub const STOOQ_BASE_URL: &str = "https://stooq.com";

pub struct StooqAdapter {
    base_url: String,
    timeout: Duration,
}

impl StooqAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(STOOQ_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn history_url(&self, symbol: &str, days: usize) -> String {
        format!(
            "{}/q/d/l/?s={}&i=d&c={}",
            self.base_url,
            symbol.to_lowercase(),
            days.clamp(1, MAX_HISTORY_DAYS)
        )
    }
}

impl PricePort for StooqAdapter {
    /// Blocking; call from a worker thread, never from an async task.
    fn fetch(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, DeskError> {
        let symbol = normalize_symbol(symbol);
        let days = days.clamp(1, MAX_HISTORY_DAYS);
        let url = self.history_url(&symbol, days);
        let unavailable = |reason: String| DeskError::data_unavailable(&symbol, reason);

        // built per call: a blocking client must not be created or dropped on an async thread
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| unavailable(format!("http client: {e}")))?;

        debug!("stooq: GET {url}");
        let response = client
            .get(&url)
            .send()
            .map_err(|e| unavailable(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP {}", response.status())));
        }
        let body = response
            .text()
            .map_err(|e| unavailable(format!("reading body: {e}")))?;

        if body.trim().is_empty() || body.trim().eq_ignore_ascii_case("no data") {
            return Ok(Vec::new());
        }

        let bars = parse_price_csv(body.as_bytes(), &symbol)?;
        Ok(tail(bars, days))
    }

    fn name(&self) -> &'static str {
        "stooq"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_url_lowercases_symbol() {
        let adapter = StooqAdapter::new(Duration::from_secs(10));
        assert_eq!(
            adapter.history_url("AAPL.US", 252),
            "https://stooq.com/q/d/l/?s=aapl.us&i=d&c=252"
        );
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let adapter = StooqAdapter::with_base_url("http://localhost:9/", Duration::from_secs(1));
        assert_eq!(
            adapter.history_url("spy", 0),
            "http://localhost:9/q/d/l/?s=spy&i=d&c=1"
        );
    }

    #[test]
    fn unreachable_host_is_data_unavailable() {
        // port 9 (discard) is closed on any sane test host
        let adapter = StooqAdapter::with_base_url("http://127.0.0.1:9", Duration::from_millis(500));
        let err = adapter.fetch("SPY", 10).unwrap_err();
        assert!(matches!(err, DeskError::DataUnavailable { ref symbol, .. } if symbol == "SPY"));
    }
}
