//! Simulation configuration.
//!
//! One immutable value per run, passed to the engine at construction.

use crate::domain::momentum::{DEFAULT_HORIZONS, Horizon};
use crate::domain::rebalance::RebalanceCadence;
use crate::domain::regime::ClassifierParams;
use crate::domain::role::RoleAssignment;
use crate::domain::tax::TaxConfig;
use chrono::NaiveDate;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_capital: f64,
    pub fee_rate: f64,
    pub tax: TaxConfig,
    pub ma_window: usize,
    pub horizons: Vec<Horizon>,
    pub roles: RoleAssignment,
    /// Buy-and-hold reference; the base instrument when unset.
    pub benchmark: Option<String>,
    pub bull_base_fraction: f64,
    pub partial_hedge: f64,
    pub use_trend_filter: bool,
    pub cadence: RebalanceCadence,
    pub decision_lag: NonZeroUsize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub risk_free_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_capital: 100_000_000.0,
            fee_rate: 0.001,
            tax: TaxConfig::default(),
            ma_window: 120,
            horizons: DEFAULT_HORIZONS.to_vec(),
            roles: RoleAssignment::default(),
            benchmark: None,
            bull_base_fraction: 0.3,
            partial_hedge: 0.0,
            use_trend_filter: true,
            cadence: RebalanceCadence::Monthly,
            decision_lag: NonZeroUsize::MIN,
            start_date: None,
            end_date: None,
            risk_free_rate: 0.0,
        }
    }
}

impl SimulationConfig {
    pub fn classifier_params(&self) -> ClassifierParams {
        ClassifierParams {
            bull_base_fraction: self.bull_base_fraction,
            partial_hedge: self.partial_hedge,
            use_trend_filter: self.use_trend_filter,
        }
    }

    pub fn benchmark_instrument(&self) -> &str {
        self.benchmark.as_deref().unwrap_or(&self.roles.base)
    }

    /// Every instrument the run needs prices for.
    pub fn required_instruments(&self) -> Vec<String> {
        let mut instruments = self.roles.instruments();
        let bench = self.benchmark_instrument();
        if !instruments.iter().any(|i| i == bench) {
            instruments.push(bench.to_string());
        }
        instruments
    }
}
