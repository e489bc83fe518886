//! Cumulative Volume Weighted Average Price.
//!
//! VWAP[i] = sum(P[0..=i] * V[0..=i]) / (sum(V[0..=i]) + 1e-9)
//!
//! Without a volume series every bar weighs 1. Non-finite prices and
//! volumes contribute nothing to either sum.

const DENOMINATOR_EPSILON: f64 = 1e-9;

pub fn volume_weighted_average_price(prices: &[f64], volumes: Option<&[f64]>) -> Vec<f64> {
    let mut values = Vec::with_capacity(prices.len());
    let mut pv_sum = 0.0;
    let mut v_sum = 0.0;

    for (i, &price) in prices.iter().enumerate() {
        let volume = match volumes {
            Some(v) => v.get(i).copied().unwrap_or(1.0),
            None => 1.0,
        };
        if price.is_finite() && volume.is_finite() {
            pv_sum += price * volume;
            v_sum += volume;
        }
        values.push(pv_sum / (v_sum + DENOMINATOR_EPSILON));
    }

    values
}
