//! Single-symbol signal backtest.
//!
//! The engine turns a bar series into a long/flat position series, charges a
//! fixed fee on every position change, and compounds the result against a
//! buy-and-hold baseline. It is pure and synchronous: identical input gives
//! bit-identical output, and degenerate input (empty, all-NaN) gives a
//! neutral result rather than an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::DeskError;
use super::indicator::{
    equity_curve, pct_change, simple_moving_average, volume_weighted_average_price,
};
use super::metrics::PerformanceStats;
use super::price_bar::{volumes, PriceBar};

/// How the raw position series is derived from prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRule {
    /// Long while SMA(short) > SMA(long).
    #[default]
    SmaCross,
    /// Long while close > cumulative VWAP.
    VwapCross,
}

/// Which bar's position earns a bar's return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalTiming {
    /// The position computed at bar t is applied to bar t's return. This
    /// uses bar t's close to trade bar t and so looks ahead by one bar.
    #[default]
    SameBar,
    /// The position computed at bar t-1 is applied to bar t's return.
    NextBar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestParams {
    pub short_window: usize,
    pub long_window: usize,
    pub fee_bps: f64,
    #[serde(default)]
    pub rule: SignalRule,
    #[serde(default)]
    pub timing: SignalTiming,
}

impl Default for BacktestParams {
    fn default() -> Self {
        BacktestParams {
            short_window: 10,
            long_window: 20,
            fee_bps: 1.0,
            rule: SignalRule::SmaCross,
            timing: SignalTiming::SameBar,
        }
    }
}

impl BacktestParams {
    /// Reject windows below one, a short window not below the long one and
    /// fees outside 0..=10000 bps.
    pub fn validate(&self) -> Result<(), DeskError> {
        if self.short_window < 1 || self.long_window < 1 {
            return Err(DeskError::validation("windows must be at least 1"));
        }
        if self.short_window >= self.long_window {
            return Err(DeskError::validation(format!(
                "short_window ({}) must be less than long_window ({})",
                self.short_window, self.long_window
            )));
        }
        if !self.fee_bps.is_finite() || !(0.0..=10_000.0).contains(&self.fee_bps) {
            return Err(DeskError::validation("fee_bps must be between 0 and 10000"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub position: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BacktestResult {
    pub buy_hold_equity: Vec<EquityPoint>,
    pub strategy_equity: Vec<EquityPoint>,
    pub signal: Vec<SignalPoint>,
    pub stats_buy_hold: PerformanceStats,
    pub stats_strategy: PerformanceStats,
    /// Number of bars on which the position changed.
    pub toggles: usize,
}

impl BacktestResult {
    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    pub fn final_buy_hold(&self) -> f64 {
        self.buy_hold_equity.last().map(|p| p.equity).unwrap_or(1.0)
    }

    pub fn final_strategy(&self) -> f64 {
        self.strategy_equity.last().map(|p| p.equity).unwrap_or(1.0)
    }
}

/// Raw long/flat positions for `closes` under `params.rule`.
pub fn compute_signal(closes: &[f64], bar_volumes: Option<&[f64]>, params: &BacktestParams) -> Vec<i8> {
    match params.rule {
        SignalRule::SmaCross => {
            let short = simple_moving_average(closes, params.short_window);
            let long = simple_moving_average(closes, params.long_window);
            short
                .iter()
                .zip(long.iter())
                .map(|(s, l)| i8::from(s > l))
                .collect()
        }
        SignalRule::VwapCross => {
            let vwap = volume_weighted_average_price(closes, bar_volumes);
            closes
                .iter()
                .zip(vwap.iter())
                .map(|(c, v)| i8::from(c > v))
                .collect()
        }
    }
}

/// Per-bar flags, true where the position differs from the previous bar's.
/// The bar before the first is treated as flat.
pub fn toggles(signal: &[i8]) -> Vec<bool> {
    let mut prev = 0i8;
    signal
        .iter()
        .map(|&s| {
            let changed = s != prev;
            prev = s;
            changed
        })
        .collect()
}

pub fn run_backtest(bars: &[PriceBar], params: &BacktestParams) -> BacktestResult {
    if bars.is_empty() {
        return BacktestResult::default();
    }

    let closes: Vec<f64> = bars
        .iter()
        .map(|b| if b.close.is_finite() { b.close } else { 0.0 })
        .collect();
    let bar_volumes = volumes(bars);

    let signal = compute_signal(&closes, bar_volumes.as_deref(), params);
    let toggled = toggles(&signal);
    let fee = params.fee_bps / 10_000.0;

    let returns = pct_change(&closes);
    let strategy_returns: Vec<f64> = returns
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let held = match params.timing {
                SignalTiming::SameBar => signal[i],
                SignalTiming::NextBar if i > 0 => signal[i - 1],
                SignalTiming::NextBar => 0,
            };
            let cost = if toggled[i] { fee } else { 0.0 };
            r * f64::from(held) - cost
        })
        .collect();

    let buy_hold = equity_curve(&returns);
    let strategy = equity_curve(&strategy_returns);

    let stats_buy_hold = PerformanceStats::compute(&buy_hold);
    let stats_strategy = PerformanceStats::compute(&strategy);

    let dated = |values: Vec<f64>| -> Vec<EquityPoint> {
        bars.iter()
            .zip(values)
            .map(|(b, equity)| EquityPoint {
                date: b.date,
                equity,
            })
            .collect()
    };

    BacktestResult {
        buy_hold_equity: dated(buy_hold),
        strategy_equity: dated(strategy),
        signal: bars
            .iter()
            .zip(signal.iter())
            .map(|(b, &position)| SignalPoint {
                date: b.date,
                position,
            })
            .collect(),
        stats_buy_hold,
        stats_strategy,
        toggles: toggled.iter().filter(|&&t| t).count(),
    }
}
