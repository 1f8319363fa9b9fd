//! Action plan from the latest close.

use chrono::NaiveDate;

use super::regime::{Regime, RegimeDecision};
use super::role::{Role, RoleAssignment, RoleWeights};

/// Holdings below this fraction are left out of the plan.
pub const MIN_HOLDING_WEIGHT: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub role: Role,
    pub instrument: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// Close the signals were read from.
    pub date: NaiveDate,
    pub regime: Regime,
    pub weights: RoleWeights,
    pub holdings: Vec<Holding>,
    /// The latest regime differs from the one the simulation ended in.
    pub change_required: bool,
}

impl Recommendation {
    pub fn new(
        date: NaiveDate,
        decision: &RegimeDecision,
        roles: &RoleAssignment,
        held_regime: Option<Regime>,
    ) -> Self {
        let holdings = decision
            .weights
            .iter()
            .filter(|&(_, w)| w > MIN_HOLDING_WEIGHT)
            .map(|(role, weight)| Holding {
                role,
                instrument: roles.instrument(role).to_string(),
                weight,
            })
            .collect();

        Recommendation {
            date,
            regime: decision.regime,
            weights: decision.weights,
            holdings,
            change_required: held_regime != Some(decision.regime),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
    }

    #[test]
    fn lists_instruments_above_threshold() {
        let decision = RegimeDecision {
            regime: Regime::DefenseMix,
            weights: RoleWeights::from_pairs(&[
                (Role::DefenseCash, 0.4995),
                (Role::DefenseBond, 0.4995),
                (Role::Base, 0.001),
            ]),
            hedged: true,
        };
        let rec = Recommendation::new(date(), &decision, &RoleAssignment::default(), None);

        let names: Vec<&str> = rec.holdings.iter().map(|h| h.instrument.as_str()).collect();
        assert_eq!(names, vec!["BIL", "IEF"]);
        assert!(rec.change_required);
    }

    #[test]
    fn no_change_when_regime_already_held() {
        let decision = RegimeDecision {
            regime: Regime::BullModerate,
            weights: RoleWeights::single(Role::Base),
            hedged: false,
        };
        let rec = Recommendation::new(
            date(),
            &decision,
            &RoleAssignment::default(),
            Some(Regime::BullModerate),
        );
        assert!(!rec.change_required);
        assert_eq!(rec.holdings.len(), 1);
        assert_eq!(rec.holdings[0].instrument, "SPY");
        assert_eq!(rec.holdings[0].role, Role::Base);
    }
}
