//! Parameter sweep: independent backtests over configuration variants.
//!
//! Every variant gets its own simulator; the price store is shared
//! read-only across worker threads.

use rayon::prelude::*;

use super::config::SimulationConfig;
use super::config_validation::validate_simulation_config;
use super::error::RegimeTraderError;
use super::metrics::Metrics;
use super::price_store::PriceSeriesStore;
use super::simulator::run_simulation;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepVariant {
    pub label: String,
    pub config: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    pub label: String,
    pub metrics: Metrics,
    pub final_capital: f64,
}

/// Value lists crossed against a base configuration. An empty list keeps
/// the base value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepGrid {
    pub fee_rates: Vec<f64>,
    pub ma_windows: Vec<usize>,
    pub bull_fractions: Vec<f64>,
    pub hedges: Vec<f64>,
}

impl SweepGrid {
    pub fn variants(&self, base: &SimulationConfig) -> Vec<SweepVariant> {
        let fee_rates = or_base(&self.fee_rates, base.fee_rate);
        let ma_windows = or_base(&self.ma_windows, base.ma_window);
        let bull_fractions = or_base(&self.bull_fractions, base.bull_base_fraction);
        let hedges = or_base(&self.hedges, base.partial_hedge);

        let mut out =
            Vec::with_capacity(fee_rates.len() * ma_windows.len() * bull_fractions.len() * hedges.len());
        for &fee_rate in &fee_rates {
            for &ma_window in &ma_windows {
                for &bull_base_fraction in &bull_fractions {
                    for &partial_hedge in &hedges {
                        out.push(SweepVariant {
                            label: format!(
                                "fee={fee_rate} ma={ma_window} bull={bull_base_fraction} hedge={partial_hedge}"
                            ),
                            config: SimulationConfig {
                                fee_rate,
                                ma_window,
                                bull_base_fraction,
                                partial_hedge,
                                ..base.clone()
                            },
                        });
                    }
                }
            }
        }
        out
    }
}

fn or_base<T: Copy>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

/// Runs every variant in parallel. All variants are validated up front so
/// a bad one fails the sweep before any work starts. Results keep input
/// order.
pub fn run_sweep(
    store: &PriceSeriesStore,
    variants: &[SweepVariant],
) -> Result<Vec<SweepOutcome>, RegimeTraderError> {
    for variant in variants {
        validate_simulation_config(&variant.config)?;
    }

    variants
        .par_iter()
        .map(|variant| -> Result<SweepOutcome, RegimeTraderError> {
            let report = run_simulation(store, &variant.config)?;
            Ok(SweepOutcome {
                label: variant.label.clone(),
                metrics: report.metrics,
                final_capital: report.final_capital,
            })
        })
        .collect()
}
