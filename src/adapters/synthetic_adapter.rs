//! Deterministic random-walk prices for demos and offline runs.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::error::DeskError;
use crate::domain::price_bar::{normalize_symbol, PriceBar};
use crate::ports::price_port::{PricePort, MAX_HISTORY_DAYS};

/// Never generate fewer bars than this, so the default SMA windows have data.
pub const MIN_SYNTHETIC_BARS: usize = 30;

/// Random walk seeded from the symbol: the same symbol always gets the same
/// closes. Dates are business days ending at `end` (today when unset).
pub struct SyntheticAdapter {
    end: Option<NaiveDate>,
}

impl SyntheticAdapter {
    pub fn new() -> Self {
        Self { end: None }
    }

    pub fn ending_on(end: NaiveDate) -> Self {
        Self { end: Some(end) }
    }
}

impl Default for SyntheticAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn seed_for(symbol: &str) -> u64 {
    // FNV-1a
    symbol.bytes().fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn business_days_ending(end: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut day = end;
    while dates.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    dates.reverse();
    dates
}

impl PricePort for SyntheticAdapter {
    fn fetch(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, DeskError> {
        let symbol = normalize_symbol(symbol);
        let n = days.clamp(MIN_SYNTHETIC_BARS, MAX_HISTORY_DAYS);
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        let mut rng = StdRng::seed_from_u64(seed_for(&symbol));

        let mut close = 100.0_f64;
        let bars = business_days_ending(end, n)
            .into_iter()
            .map(|date| {
                let open = close;
                close *= 1.0 + rng.gen_range(-0.02..0.02);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
                PriceBar {
                    symbol: symbol.clone(),
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume: Some(rng.gen_range(100_000..2_000_000) as f64),
                }
            })
            .collect();

        Ok(bars)
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
