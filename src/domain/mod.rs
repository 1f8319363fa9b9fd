//! Core domain types and logic.

pub mod benchmark;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod metrics;
pub mod momentum;
pub mod portfolio;
pub mod price_series;
pub mod price_store;
pub mod rebalance;
pub mod recommendation;
pub mod regime;
pub mod role;
pub mod simulator;
pub mod sweep;
pub mod tax;
pub mod trend;
