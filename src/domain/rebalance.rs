//! Rebalance scheduling and turnover cost.

use crate::domain::regime::{Regime, RegimeDecision};
use crate::domain::role::RoleWeights;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Calendar period whose boundary forces a rebalance back to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebalanceCadence {
    /// Only regime changes trigger trades.
    Signal,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl RebalanceCadence {
    pub fn crosses_boundary(self, date: NaiveDate, prev_date: NaiveDate) -> bool {
        match self {
            RebalanceCadence::Signal => false,
            RebalanceCadence::Weekly => date.iso_week() != prev_date.iso_week(),
            RebalanceCadence::Monthly => {
                (date.year(), date.month()) != (prev_date.year(), prev_date.month())
            }
            RebalanceCadence::Quarterly => {
                (date.year(), date.month0() / 3) != (prev_date.year(), prev_date.month0() / 3)
            }
            RebalanceCadence::Yearly => date.year() != prev_date.year(),
        }
    }
}

impl FromStr for RebalanceCadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "signal" | "none" => Ok(RebalanceCadence::Signal),
            "weekly" => Ok(RebalanceCadence::Weekly),
            "monthly" => Ok(RebalanceCadence::Monthly),
            "quarterly" => Ok(RebalanceCadence::Quarterly),
            "yearly" | "annual" => Ok(RebalanceCadence::Yearly),
            other => Err(format!(
                "unknown cadence '{other}', expected signal, weekly, monthly, quarterly or yearly"
            )),
        }
    }
}

impl fmt::Display for RebalanceCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RebalanceCadence::Signal => "signal",
            RebalanceCadence::Weekly => "weekly",
            RebalanceCadence::Monthly => "monthly",
            RebalanceCadence::Quarterly => "quarterly",
            RebalanceCadence::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceTrigger {
    SignalChange,
    PeriodBoundary,
}

impl fmt::Display for RebalanceTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceTrigger::SignalChange => f.write_str("signal-change"),
            RebalanceTrigger::PeriodBoundary => f.write_str("period-boundary"),
        }
    }
}

/// fee = (turnover / 2) * capital * fee_rate
///
/// Halving turns round-trip turnover (sells plus buys) into one-way
/// traded notional.
pub fn rebalance_fee(capital: f64, prev: &RoleWeights, target: &RoleWeights, fee_rate: f64) -> f64 {
    prev.turnover(target) / 2.0 * capital * fee_rate
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalancingScheduler {
    cadence: RebalanceCadence,
    fee_rate: f64,
}

impl RebalancingScheduler {
    pub fn new(cadence: RebalanceCadence, fee_rate: f64) -> Self {
        RebalancingScheduler { cadence, fee_rate }
    }

    /// A regime change wins over a period boundary when both apply. With no
    /// previous regime (first decision of a run) the regime counts as changed.
    pub fn should_rebalance(
        &self,
        prev_regime: Option<Regime>,
        target: &RegimeDecision,
        date: NaiveDate,
        prev_date: Option<NaiveDate>,
    ) -> Option<RebalanceTrigger> {
        if prev_regime != Some(target.regime) {
            return Some(RebalanceTrigger::SignalChange);
        }
        match prev_date {
            Some(prev) if self.cadence.crosses_boundary(date, prev) => {
                Some(RebalanceTrigger::PeriodBoundary)
            }
            _ => None,
        }
    }

    pub fn cost(&self, capital: f64, prev: &RoleWeights, target: &RoleWeights) -> f64 {
        rebalance_fee(capital, prev, target, self.fee_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::Role;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn decision(regime: Regime) -> RegimeDecision {
        RegimeDecision {
            regime,
            weights: RoleWeights::single(Role::DefenseCash),
            hedged: false,
        }
    }

    #[test]
    fn full_swap_fee_is_one_way_notional() {
        let fee = rebalance_fee(
            1_000_000.0,
            &RoleWeights::single(Role::DefenseCash),
            &RoleWeights::single(Role::Base),
            0.001,
        );
        assert!((fee - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn partial_swap_fee() {
        let prev = RoleWeights::from_pairs(&[(Role::Base, 0.3), (Role::Leveraged, 0.7)]);
        let target = RoleWeights::single(Role::Base);
        // turnover = 0.7 + 0.7 = 1.4, one-way 0.7
        let fee = rebalance_fee(100_000.0, &prev, &target, 0.002);
        assert!((fee - 140.0).abs() < 1e-9);
    }

    #[test]
    fn no_change_costs_nothing() {
        let w = RoleWeights::single(Role::Base);
        assert_eq!(rebalance_fee(1e9, &w, &w, 0.01), 0.0);
    }

    #[test]
    fn first_decision_always_rebalances() {
        let s = RebalancingScheduler::new(RebalanceCadence::Monthly, 0.001);
        assert_eq!(
            s.should_rebalance(None, &decision(Regime::DefenseCash), date(2024, 1, 3), None),
            Some(RebalanceTrigger::SignalChange)
        );
    }

    #[test]
    fn same_regime_same_month_skips() {
        let s = RebalancingScheduler::new(RebalanceCadence::Monthly, 0.001);
        assert_eq!(
            s.should_rebalance(
                Some(Regime::DefenseMix),
                &decision(Regime::DefenseMix),
                date(2024, 1, 4),
                Some(date(2024, 1, 3)),
            ),
            None
        );
    }

    #[test]
    fn month_boundary_triggers() {
        let s = RebalancingScheduler::new(RebalanceCadence::Monthly, 0.001);
        assert_eq!(
            s.should_rebalance(
                Some(Regime::DefenseMix),
                &decision(Regime::DefenseMix),
                date(2024, 2, 1),
                Some(date(2024, 1, 31)),
            ),
            Some(RebalanceTrigger::PeriodBoundary)
        );
    }

    #[test]
    fn regime_change_wins_over_boundary() {
        let s = RebalancingScheduler::new(RebalanceCadence::Monthly, 0.001);
        assert_eq!(
            s.should_rebalance(
                Some(Regime::DefenseMix),
                &decision(Regime::BullModerate),
                date(2024, 2, 1),
                Some(date(2024, 1, 31)),
            ),
            Some(RebalanceTrigger::SignalChange)
        );
    }

    #[test]
    fn cadence_boundaries() {
        let jan31 = date(2024, 1, 31);
        let feb1 = date(2024, 2, 1);
        let apr1 = date(2024, 4, 1);
        let mar29 = date(2024, 3, 29);

        assert!(!RebalanceCadence::Signal.crosses_boundary(feb1, jan31));
        assert!(RebalanceCadence::Monthly.crosses_boundary(feb1, jan31));
        assert!(!RebalanceCadence::Quarterly.crosses_boundary(feb1, jan31));
        assert!(RebalanceCadence::Quarterly.crosses_boundary(apr1, mar29));
        assert!(!RebalanceCadence::Yearly.crosses_boundary(apr1, mar29));
        assert!(RebalanceCadence::Yearly.crosses_boundary(date(2025, 1, 2), date(2024, 12, 31)));
        // Wed -> Thu same ISO week, Fri -> Mon next week.
        assert!(!RebalanceCadence::Weekly.crosses_boundary(feb1, jan31));
        assert!(RebalanceCadence::Weekly.crosses_boundary(date(2024, 2, 5), date(2024, 2, 2)));
    }

    #[test]
    fn same_month_different_year_is_a_boundary() {
        assert!(RebalanceCadence::Monthly.crosses_boundary(date(2025, 1, 2), date(2024, 1, 31)));
    }

    #[test]
    fn cadence_parses_and_displays() {
        assert_eq!("Monthly".parse::<RebalanceCadence>(), Ok(RebalanceCadence::Monthly));
        assert_eq!("signal".parse::<RebalanceCadence>(), Ok(RebalanceCadence::Signal));
        assert_eq!("annual".parse::<RebalanceCadence>(), Ok(RebalanceCadence::Yearly));
        assert!("fortnightly".parse::<RebalanceCadence>().is_err());
        assert_eq!(RebalanceCadence::Quarterly.to_string(), "quarterly");
    }
}
