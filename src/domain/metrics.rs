//! Performance statistics over an equity curve.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::indicator::{drawdown, pct_change};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary statistics of one equity curve.
///
/// Every field is finite: any value that comes out NaN or infinite is
/// reported as 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub cagr: f64,
    pub volatility: f64,
    /// Deepest peak-to-trough decline, ≤ 0.
    pub max_drawdown: f64,
    pub sharpe: f64,
}

impl PerformanceStats {
    pub fn compute(equity: &[f64]) -> Self {
        let Some(&last) = equity.last() else {
            return Self::default();
        };

        let n = equity.len() as f64;
        let cagr = last.powf(TRADING_DAYS_PER_YEAR / n) - 1.0;

        let returns = pct_change(equity);
        let volatility = returns.iter().std_dev() * TRADING_DAYS_PER_YEAR.sqrt();
        let mean = returns.iter().mean();

        let max_drawdown = drawdown(equity).into_iter().fold(0.0_f64, f64::min);

        let sharpe = if volatility != 0.0 {
            (mean * TRADING_DAYS_PER_YEAR) / volatility
        } else {
            0.0
        };

        PerformanceStats {
            cagr: finite_or_zero(cagr),
            volatility: finite_or_zero(volatility),
            max_drawdown: finite_or_zero(max_drawdown),
            sharpe: finite_or_zero(sharpe),
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
