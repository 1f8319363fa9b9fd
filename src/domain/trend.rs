//! Simple moving average trend filter.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i])
//! Warmup: absent until n consecutive closes exist.

use crate::domain::price_store::PriceSeriesStore;

pub fn moving_average_series(
    store: &PriceSeriesStore,
    instrument: usize,
    window: usize,
) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(store.len());
    if window == 0 {
        values.resize(store.len(), None);
        return values;
    }

    let mut sum = 0.0;
    let mut run = 0usize;
    for idx in 0..store.len() {
        match store.price(instrument, idx) {
            Some(close) => {
                sum += close;
                run += 1;
                if run > window {
                    // Every index in the run is filled, so the dropped close exists.
                    sum -= store.price(instrument, idx - window).unwrap_or(0.0);
                }
            }
            None => {
                sum = 0.0;
                run = 0;
            }
        }
        values.push((run >= window).then(|| sum / window as f64));
    }
    values
}

/// Strict `price > ma`; an absent operand fails.
pub fn is_above(price: Option<f64>, moving_average: Option<f64>) -> bool {
    match (price, moving_average) {
        (Some(p), Some(ma)) => p > ma,
        _ => false,
    }
}
