//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]), with a partial window over the first n-1
//! bars (minimum period 1). Non-finite values inside a window are skipped;
//! a window with no finite value yields NaN.

pub fn simple_moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut values = Vec::with_capacity(series.len());

    let mut sum = 0.0;
    let mut count = 0usize;

    for (i, &x) in series.iter().enumerate() {
        if x.is_finite() {
            sum += x;
            count += 1;
        }
        if i >= window {
            let dropped = series[i - window];
            if dropped.is_finite() {
                sum -= dropped;
                count -= 1;
            }
        }
        values.push(if count > 0 { sum / count as f64 } else { f64::NAN });
    }

    values
}
