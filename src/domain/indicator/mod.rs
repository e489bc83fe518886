//! Technical indicators over plain numeric series.
//!
//! Every function here is total: it takes an ordered slice and returns a
//! `Vec<f64>` of the same length. Short input is never an error, a window
//! longer than the available history just averages what is there, and an
//! empty slice produces an empty vector.
//!
//! - [`sma::simple_moving_average`]
//! - [`ema::exponential_moving_average`]
//! - [`rsi::rsi`]
//! - [`atr::average_true_range`]
//! - [`vwap::volume_weighted_average_price`]
//! - [`pct_change`], [`equity_curve`], [`drawdown`] for return arithmetic

pub mod atr;
pub mod ema;
pub mod rsi;
pub mod sma;
pub mod vwap;

pub use atr::{average_true_range, DEFAULT_ATR_WINDOW};
pub use ema::exponential_moving_average;
pub use rsi::{rsi, DEFAULT_RSI_WINDOW};
pub use sma::simple_moving_average;
pub use vwap::volume_weighted_average_price;

use std::fmt;

/// Indicator identity + parameters, used to label overlay series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Vwap,
}

impl IndicatorKind {
    /// Evaluate this indicator over closing prices (and volumes for VWAP).
    pub fn compute(&self, closes: &[f64], volumes: Option<&[f64]>) -> Vec<f64> {
        match *self {
            IndicatorKind::Sma(window) => simple_moving_average(closes, window),
            IndicatorKind::Ema(window) => exponential_moving_average(closes, window),
            IndicatorKind::Rsi(window) => rsi(closes, window),
            IndicatorKind::Vwap => volume_weighted_average_price(closes, volumes),
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(window) => write!(f, "SMA({})", window),
            IndicatorKind::Ema(window) => write!(f, "EMA({})", window),
            IndicatorKind::Rsi(window) => write!(f, "RSI({})", window),
            IndicatorKind::Vwap => write!(f, "VWAP"),
        }
    }
}

/// Bar-over-bar percentage change. The first element is 0.
///
/// A step whose previous value is not a positive finite number has no
/// defined return and is reported as 0.
pub fn pct_change(series: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    for (i, &value) in series.iter().enumerate() {
        if i == 0 {
            out.push(0.0);
            continue;
        }
        let prev = series[i - 1];
        let change = if prev > 0.0 && prev.is_finite() && value.is_finite() {
            value / prev - 1.0
        } else {
            0.0
        };
        out.push(change);
    }
    out
}

/// Compound per-bar returns into an equity curve starting from 1.0.
///
/// Each step factor is floored at 0: a position cannot lose more than
/// everything in a single bar.
pub fn equity_curve(returns: &[f64]) -> Vec<f64> {
    let mut equity = 1.0_f64;
    returns
        .iter()
        .map(|r| {
            let factor = (1.0 + r).max(0.0);
            equity *= if factor.is_finite() { factor } else { 1.0 };
            equity
        })
        .collect()
}

/// `equity / running_max(equity) - 1`, always ≤ 0.
pub fn drawdown(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&e| {
            if e > peak {
                peak = e;
            }
            if peak > 0.0 { e / peak - 1.0 } else { 0.0 }
        })
        .collect()
}
