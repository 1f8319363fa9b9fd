//! Multi-horizon composite momentum.
//!
//! score[i] = sum(weight_h * (C[i] / C[i - lookback_h] - 1))
//!
//! With the default horizons this is the 13612W score:
//! 12*r21 + 4*r63 + 2*r126 + 1*r252.
//! A horizon without `lookback + 1` observations makes the whole score
//! absent; an absent score never counts as positive.

use crate::domain::price_store::PriceSeriesStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Horizon {
    pub lookback: usize,
    pub weight: f64,
}

impl Horizon {
    pub const fn new(lookback: usize, weight: f64) -> Self {
        Horizon { lookback, weight }
    }
}

pub const DEFAULT_HORIZONS: [Horizon; 4] = [
    Horizon::new(21, 12.0),
    Horizon::new(63, 4.0),
    Horizon::new(126, 2.0),
    Horizon::new(252, 1.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct MomentumScorer {
    horizons: Vec<Horizon>,
}

impl Default for MomentumScorer {
    fn default() -> Self {
        MomentumScorer::new(DEFAULT_HORIZONS.to_vec())
    }
}

impl MomentumScorer {
    pub fn new(horizons: Vec<Horizon>) -> Self {
        MomentumScorer { horizons }
    }

    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    pub fn score(&self, store: &PriceSeriesStore, instrument: usize, idx: usize) -> Option<f64> {
        self.horizons
            .iter()
            .map(|h| {
                store
                    .trailing_return(instrument, idx, h.lookback)
                    .map(|r| r * h.weight)
            })
            .sum()
    }

    pub fn score_series(&self, store: &PriceSeriesStore, instrument: usize) -> Vec<Option<f64>> {
        (0..store.len())
            .map(|idx| self.score(store, instrument, idx))
            .collect()
    }
}

/// `> 0` test shared by every signal consumer; zero and absent both fail.
pub fn is_positive(score: Option<f64>) -> bool {
    matches!(score, Some(s) if s > 0.0)
}
