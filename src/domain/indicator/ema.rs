//! Exponential Moving Average.
//!
//! k = 2/(n+1). Over the first n bars the value is the running mean (the
//! partial-window seed), then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Non-finite closes carry the previous value forward.

pub fn exponential_moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let k = 2.0 / (window as f64 + 1.0);
    let mut values = Vec::with_capacity(series.len());
    let mut ema = f64::NAN;
    let mut sum = 0.0;
    let mut count = 0usize;

    for (i, &x) in series.iter().enumerate() {
        if x.is_finite() {
            if i < window {
                sum += x;
                count += 1;
                ema = sum / count as f64;
            } else if ema.is_finite() {
                ema = x * k + ema * (1.0 - k);
            } else {
                ema = x;
            }
        }
        values.push(ema);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn ema_empty() {
        assert!(exponential_moving_average(&[], 20).is_empty());
    }

    #[test]
    fn ema_constant_series() {
        assert_eq!(exponential_moving_average(&[10.0; 30], 20), vec![10.0; 30]);
    }

    #[test]
    fn ema_seeds_with_running_mean() {
        let out = exponential_moving_average(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert_relative_eq!(out[0], 10.0);
        assert_relative_eq!(out[1], 15.0);
        assert_relative_eq!(out[2], 20.0);
        // k = 0.5
        assert_relative_eq!(out[3], 30.0);
        assert_relative_eq!(out[4], 40.0);
    }

    #[test]
    fn ema_skips_nan() {
        let out = exponential_moving_average(&[f64::NAN, 4.0, f64::NAN, 8.0], 1);
        assert!(out[0].is_nan());
        assert_eq!(out[1..], [4.0, 4.0, 8.0]);
    }

    proptest! {
        #[test]
        fn ema_length_and_bounds(
            series in prop::collection::vec(1.0f64..1000.0, 0..200),
            window in 0usize..60,
        ) {
            let out = exponential_moving_average(&series, window);
            prop_assert_eq!(out.len(), series.len());
            let lo = series.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = series.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            for v in out {
                prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
            }
        }
    }
}
