//! Average True Range.
//!
//! TR[0] = H[0] - L[0]
//! TR[i] = max(H[i] - L[i], |H[i] - C[i-1]|, |L[i] - C[i-1]|)
//! ATR(n) = simple trailing mean of TR, partial windows allowed.

use super::sma::simple_moving_average;

pub const DEFAULT_ATR_WINDOW: usize = 14;

pub fn average_true_range(high: &[f64], low: &[f64], close: &[f64], window: usize) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    let true_range: Vec<f64> = (0..n)
        .map(|i| {
            let range = high[i] - low[i];
            if i == 0 {
                return range;
            }
            let prev = close[i - 1];
            range
                .max((high[i] - prev).abs())
                .max((low[i] - prev).abs())
        })
        .collect();
    simple_moving_average(&true_range, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn atr_empty() {
        assert!(average_true_range(&[], &[], &[], 14).is_empty());
    }

    #[test]
    fn atr_uses_gaps_from_previous_close() {
        let high = [11.0, 15.0, 12.0];
        let low = [9.0, 13.0, 11.0];
        let close = [10.0, 14.0, 11.5];
        // TR = [2, 5 (15 - 10), 3 (14 - 11)]
        let out = average_true_range(&high, &low, &close, 2);
        assert_relative_eq!(out[0], 2.0);
        assert_relative_eq!(out[1], 3.5);
        assert_relative_eq!(out[2], 4.0);
    }

    #[test]
    fn atr_truncates_to_shortest_input() {
        let out = average_true_range(&[2.0, 2.0, 2.0], &[1.0, 1.0], &[1.5, 1.5, 1.5], 14);
        assert_eq!(out.len(), 2);
    }
}
