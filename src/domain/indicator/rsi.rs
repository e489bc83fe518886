//! RSI (Relative Strength Index).
//!
//! Simple (not Wilder-smoothed) trailing averages of gains and losses over the
//! last `window` price changes, partial windows allowed.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! - avg_loss == 0 and avg_gain > 0: RSI = 100
//! - avg_loss == 0 and avg_gain == 0 (no movement, or the first bar): RSI = 50

pub const DEFAULT_RSI_WINDOW: usize = 14;

const NEUTRAL_RSI: f64 = 50.0;

pub fn rsi(series: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut values = Vec::with_capacity(series.len());

    // changes[i] is the move into bar i; bar 0 has none.
    let changes: Vec<Option<f64>> = series
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            if i == 0 {
                return None;
            }
            let change = x - series[i - 1];
            change.is_finite().then_some(change)
        })
        .collect();

    for i in 0..series.len() {
        let start = (i + 1).saturating_sub(window);
        let mut gain_sum = 0.0;
        let mut loss_sum = 0.0;
        let mut count = 0usize;

        for change in changes[start..=i].iter().flatten() {
            if *change > 0.0 {
                gain_sum += change;
            } else {
                loss_sum -= change;
            }
            count += 1;
        }

        if count == 0 {
            values.push(NEUTRAL_RSI);
            continue;
        }

        let avg_gain = gain_sum / count as f64;
        let avg_loss = loss_sum / count as f64;

        let value = if avg_loss == 0.0 {
            if avg_gain > 0.0 { 100.0 } else { NEUTRAL_RSI }
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };
        values.push(value);
    }

    values
}
