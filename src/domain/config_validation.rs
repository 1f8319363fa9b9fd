//! Configuration validation.
//!
//! Runs before any simulation work; the first problem found is reported
//! with the INI section and key it came from.

use crate::domain::config::SimulationConfig;
use crate::domain::error::RegimeTraderError;
use crate::domain::regime::{ClassifierParams, RegimeSignals, decide};
use crate::domain::role::Role;

const WEIGHT_TOLERANCE: f64 = 1e-9;

pub fn validate_simulation_config(config: &SimulationConfig) -> Result<(), RegimeTraderError> {
    validate_initial_capital(config)?;
    validate_fee_rate(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    validate_tax(config)?;
    validate_ma_window(config)?;
    validate_horizons(config)?;
    validate_fractions(config)?;
    validate_roles(config)?;
    validate_allocations(&config.classifier_params())?;
    Ok(())
}

fn validate_initial_capital(config: &SimulationConfig) -> Result<(), RegimeTraderError> {
    if !config.initial_capital.is_finite() || config.initial_capital <= 0.0 {
        return Err(RegimeTraderError::invalid(
            "simulation",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_fee_rate(config: &SimulationConfig) -> Result<(), RegimeTraderError> {
    if !config.fee_rate.is_finite() || config.fee_rate <= 0.0 || config.fee_rate >= 1.0 {
        return Err(RegimeTraderError::invalid(
            "simulation",
            "fee_rate",
            "fee_rate must be a fraction in (0, 1)",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &SimulationConfig) -> Result<(), RegimeTraderError> {
    let value = config.risk_free_rate;
    if !value.is_finite() || !(0.0..1.0).contains(&value) {
        return Err(RegimeTraderError::invalid(
            "simulation",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &SimulationConfig) -> Result<(), RegimeTraderError> {
    if let (Some(start), Some(end)) = (config.start_date, config.end_date) {
        if start >= end {
            return Err(RegimeTraderError::invalid(
                "simulation",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

fn validate_tax(config: &SimulationConfig) -> Result<(), RegimeTraderError> {
    let tax = &config.tax;
    if !tax.deduction.is_finite() || tax.deduction < 0.0 {
        return Err(RegimeTraderError::invalid(
            "tax",
            "deduction",
            "deduction must be non-negative",
        ));
    }
    if !tax.rate.is_finite() || !(0.0..1.0).contains(&tax.rate) {
        return Err(RegimeTraderError::invalid(
            "tax",
            "rate",
            "rate must be a fraction in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_ma_window(config: &SimulationConfig) -> Result<(), RegimeTraderError> {
    if config.ma_window == 0 {
        return Err(RegimeTraderError::invalid(
            "strategy",
            "ma_window",
            "ma_window must be at least 1",
        ));
    }
    Ok(())
}

fn validate_horizons(config: &SimulationConfig) -> Result<(), RegimeTraderError> {
    if config.horizons.is_empty() {
        return Err(RegimeTraderError::invalid(
            "strategy",
            "momentum_lookbacks",
            "at least one momentum horizon is required",
        ));
    }
    for h in &config.horizons {
        if h.lookback == 0 {
            return Err(RegimeTraderError::invalid(
                "strategy",
                "momentum_lookbacks",
                "lookbacks must be at least 1",
            ));
        }
        if !h.weight.is_finite() {
            return Err(RegimeTraderError::invalid(
                "strategy",
                "momentum_weights",
                "weights must be finite",
            ));
        }
    }
    Ok(())
}

fn validate_fractions(config: &SimulationConfig) -> Result<(), RegimeTraderError> {
    for (key, value) in [
        ("bull_base_fraction", config.bull_base_fraction),
        ("partial_hedge", config.partial_hedge),
    ] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(RegimeTraderError::invalid(
                "strategy",
                key,
                format!("{key} must be between 0 and 1"),
            ));
        }
    }
    Ok(())
}

fn validate_roles(config: &SimulationConfig) -> Result<(), RegimeTraderError> {
    for role in Role::ALL {
        if config.roles.instrument(role).trim().is_empty() {
            return Err(RegimeTraderError::ConfigMissing {
                section: "instruments".to_string(),
                key: role.config_key().to_string(),
            });
        }
    }

    // Held roles must map to distinct instruments. The canary may repeat one.
    for (i, a) in Role::HELD.iter().enumerate() {
        for b in &Role::HELD[i + 1..] {
            if config.roles.instrument(*a) == config.roles.instrument(*b) {
                return Err(RegimeTraderError::invalid(
                    "instruments",
                    b.config_key(),
                    format!(
                        "{} and {} both map to {}",
                        a.config_key(),
                        b.config_key(),
                        config.roles.instrument(*a)
                    ),
                ));
            }
        }
    }

    if let Some(bench) = &config.benchmark {
        if bench.trim().is_empty() {
            return Err(RegimeTraderError::invalid(
                "instruments",
                "benchmark",
                "benchmark must not be blank",
            ));
        }
    }
    Ok(())
}

/// Walks every branch of the decision rule and checks the resulting
/// allocation is a valid weight vector.
pub fn validate_allocations(params: &ClassifierParams) -> Result<(), RegimeTraderError> {
    let levels = [Some(1.0), Some(-1.0), None];
    let trend = [(Some(2.0), Some(1.0)), (Some(1.0), Some(2.0))];

    for canary in levels {
        for base in levels {
            for cash in levels {
                for bond in levels {
                    for (base_price, base_ma) in trend {
                        let signals = RegimeSignals {
                            canary,
                            base,
                            defense_cash: cash,
                            defense_bond: bond,
                            base_price,
                            base_ma,
                        };
                        let decision = decide(&signals, params);
                        let sum = decision.weights.sum();
                        let in_range = decision
                            .weights
                            .iter()
                            .all(|(_, w)| (0.0..=1.0 + WEIGHT_TOLERANCE).contains(&w));
                        if (sum - 1.0).abs() > WEIGHT_TOLERANCE || !in_range {
                            return Err(RegimeTraderError::invalid(
                                "strategy",
                                "bull_base_fraction",
                                format!(
                                    "{} allocation does not sum to 1 ({sum})",
                                    decision.regime
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
