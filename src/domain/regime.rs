//! Regime classification: momentum and trend signals to a target allocation.
//!
//! Decision rule, evaluated on signals observed `decision_lag` trading days
//! before the decision date:
//!
//! 1. canary > 0 and base > 0 (risk on)
//!    - base close above its moving average (or trend filter off):
//!      `BullAggressive`, base/leveraged split
//!    - otherwise: `BullModerate`, 100% base
//! 2. risk off: a partial hedge stays in base, the rest goes to
//!    - cash > 0 and bond > 0: `DefenseMix`, 50/50
//!    - only bond > 0: `DefenseBond`
//!    - only cash > 0, or neither: `DefenseCash`
//!
//! A zero or absent score fails every `> 0` test.

use crate::domain::config::SimulationConfig;
use crate::domain::error::RegimeTraderError;
use crate::domain::momentum::{MomentumScorer, is_positive};
use crate::domain::price_store::PriceSeriesStore;
use crate::domain::role::{Role, RoleAssignment, RoleWeights};
use crate::domain::trend::{is_above, moving_average_series};
use std::fmt;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    BullAggressive,
    BullModerate,
    DefenseMix,
    DefenseBond,
    DefenseCash,
}

impl Regime {
    pub fn is_bull(self) -> bool {
        matches!(self, Regime::BullAggressive | Regime::BullModerate)
    }

    pub fn label(self) -> &'static str {
        match self {
            Regime::BullAggressive => "bull-aggressive",
            Regime::BullModerate => "bull-moderate",
            Regime::DefenseMix => "defense-mix",
            Regime::DefenseBond => "defense-bond",
            Regime::DefenseCash => "defense-cash",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeDecision {
    pub regime: Regime,
    pub weights: RoleWeights,
    /// A partial hedge in the base instrument is part of `weights`.
    pub hedged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierParams {
    /// Base share of the bull-aggressive split; leveraged takes the rest.
    pub bull_base_fraction: f64,
    /// Base share kept during defensive regimes.
    pub partial_hedge: f64,
    pub use_trend_filter: bool,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        ClassifierParams {
            bull_base_fraction: 0.3,
            partial_hedge: 0.0,
            use_trend_filter: true,
        }
    }
}

/// Signal snapshot for one observation date.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegimeSignals {
    pub canary: Option<f64>,
    pub base: Option<f64>,
    pub defense_cash: Option<f64>,
    pub defense_bond: Option<f64>,
    pub base_price: Option<f64>,
    pub base_ma: Option<f64>,
}

pub fn decide(signals: &RegimeSignals, params: &ClassifierParams) -> RegimeDecision {
    if is_positive(signals.canary) && is_positive(signals.base) {
        let trending = !params.use_trend_filter || is_above(signals.base_price, signals.base_ma);
        return if trending {
            RegimeDecision {
                regime: Regime::BullAggressive,
                weights: RoleWeights::from_pairs(&[
                    (Role::Base, params.bull_base_fraction),
                    (Role::Leveraged, 1.0 - params.bull_base_fraction),
                ]),
                hedged: false,
            }
        } else {
            RegimeDecision {
                regime: Regime::BullModerate,
                weights: RoleWeights::single(Role::Base),
                hedged: false,
            }
        };
    }

    let (regime, defense) = match (
        is_positive(signals.defense_cash),
        is_positive(signals.defense_bond),
    ) {
        (true, true) => (
            Regime::DefenseMix,
            RoleWeights::from_pairs(&[(Role::DefenseCash, 0.5), (Role::DefenseBond, 0.5)]),
        ),
        (false, true) => (Regime::DefenseBond, RoleWeights::single(Role::DefenseBond)),
        (true, false) | (false, false) => {
            (Regime::DefenseCash, RoleWeights::single(Role::DefenseCash))
        }
    };

    let hedge = params.partial_hedge;
    let mut weights = defense.scaled(1.0 - hedge);
    weights.add(Role::Base, hedge);

    RegimeDecision {
        regime,
        weights,
        hedged: hedge > 0.0,
    }
}

/// Precomputed signal columns for one run.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    params: ClassifierParams,
    decision_lag: NonZeroUsize,
    canary: Vec<Option<f64>>,
    base: Vec<Option<f64>>,
    defense_cash: Vec<Option<f64>>,
    defense_bond: Vec<Option<f64>>,
    base_price: Vec<Option<f64>>,
    base_ma: Vec<Option<f64>>,
}

impl RegimeClassifier {
    pub fn new(
        store: &PriceSeriesStore,
        roles: &RoleAssignment,
        scorer: &MomentumScorer,
        ma_window: usize,
        params: ClassifierParams,
        decision_lag: NonZeroUsize,
    ) -> Result<Self, RegimeTraderError> {
        let scores = |role: Role| -> Result<Vec<Option<f64>>, RegimeTraderError> {
            let instrument = store.index_of(roles.instrument(role))?;
            Ok(scorer.score_series(store, instrument))
        };

        let base_idx = store.index_of(roles.instrument(Role::Base))?;
        let base_price = (0..store.len()).map(|i| store.price(base_idx, i)).collect();

        Ok(RegimeClassifier {
            params,
            decision_lag,
            canary: scores(Role::Canary)?,
            base: scores(Role::Base)?,
            defense_cash: scores(Role::DefenseCash)?,
            defense_bond: scores(Role::DefenseBond)?,
            base_price,
            base_ma: moving_average_series(store, base_idx, ma_window),
        })
    }

    pub fn from_config(
        store: &PriceSeriesStore,
        config: &SimulationConfig,
    ) -> Result<Self, RegimeTraderError> {
        Self::new(
            store,
            &config.roles,
            &MomentumScorer::new(config.horizons.clone()),
            config.ma_window,
            config.classifier_params(),
            config.decision_lag,
        )
    }

    pub fn decision_lag(&self) -> usize {
        self.decision_lag.get()
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Signals as observed at the close of `idx`.
    pub fn signals_at(&self, idx: usize) -> RegimeSignals {
        let at = |col: &Vec<Option<f64>>| col.get(idx).copied().flatten();
        RegimeSignals {
            canary: at(&self.canary),
            base: at(&self.base),
            defense_cash: at(&self.defense_cash),
            defense_bond: at(&self.defense_bond),
            base_price: at(&self.base_price),
            base_ma: at(&self.base_ma),
        }
    }

    /// Decision for trading on `idx`, from the close `decision_lag` days
    /// earlier. Before enough days exist every signal is absent.
    pub fn classify(&self, idx: usize) -> RegimeDecision {
        let signals = idx
            .checked_sub(self.decision_lag.get())
            .map(|observed| self.signals_at(observed))
            .unwrap_or_default();
        decide(&signals, &self.params)
    }

    /// Decision from the close of `idx` itself, for acting on the next
    /// session. Never used inside the simulation loop.
    pub fn classify_close(&self, idx: usize) -> RegimeDecision {
        decide(&self.signals_at(idx), &self.params)
    }

    pub fn classify_latest(&self) -> Option<(usize, RegimeDecision)> {
        let last = self.len().checked_sub(1)?;
        Some((last, self.classify_close(last)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::momentum::Horizon;
    use crate::domain::price_series::PriceSeries;
    use chrono::NaiveDate;

    fn risk_on() -> RegimeSignals {
        RegimeSignals {
            canary: Some(0.5),
            base: Some(0.8),
            defense_cash: Some(0.01),
            defense_bond: Some(-0.2),
            base_price: Some(110.0),
            base_ma: Some(100.0),
        }
    }

    fn risk_off(cash: Option<f64>, bond: Option<f64>) -> RegimeSignals {
        RegimeSignals {
            canary: Some(-0.1),
            base: Some(0.4),
            defense_cash: cash,
            defense_bond: bond,
            base_price: Some(110.0),
            base_ma: Some(100.0),
        }
    }

    fn assert_sums_to_one(decision: &RegimeDecision) {
        assert!((decision.weights.sum() - 1.0).abs() < 1e-12, "{decision:?}");
    }

    #[test]
    fn bull_above_ma_splits_base_and_leveraged() {
        let d = decide(&risk_on(), &ClassifierParams::default());
        assert_eq!(d.regime, Regime::BullAggressive);
        assert!((d.weights.get(Role::Base) - 0.3).abs() < 1e-12);
        assert!((d.weights.get(Role::Leveraged) - 0.7).abs() < 1e-12);
        assert_sums_to_one(&d);
    }

    #[test]
    fn bull_below_ma_holds_base_only() {
        let signals = RegimeSignals {
            base_price: Some(95.0),
            ..risk_on()
        };
        let d = decide(&signals, &ClassifierParams::default());
        assert_eq!(d.regime, Regime::BullModerate);
        assert_eq!(d.weights, RoleWeights::single(Role::Base));
    }

    #[test]
    fn price_equal_to_ma_is_not_above() {
        let signals = RegimeSignals {
            base_price: Some(100.0),
            ..risk_on()
        };
        assert_eq!(
            decide(&signals, &ClassifierParams::default()).regime,
            Regime::BullModerate
        );
    }

    #[test]
    fn absent_ma_is_treated_as_below() {
        let signals = RegimeSignals {
            base_ma: None,
            ..risk_on()
        };
        assert_eq!(
            decide(&signals, &ClassifierParams::default()).regime,
            Regime::BullModerate
        );
    }

    #[test]
    fn trend_filter_off_always_splits() {
        let params = ClassifierParams {
            use_trend_filter: false,
            ..ClassifierParams::default()
        };
        let signals = RegimeSignals {
            base_price: Some(50.0),
            ..risk_on()
        };
        assert_eq!(decide(&signals, &params).regime, Regime::BullAggressive);
    }

    #[test]
    fn zero_canary_score_is_not_bull() {
        let signals = RegimeSignals {
            canary: Some(0.0),
            ..risk_on()
        };
        assert!(!decide(&signals, &ClassifierParams::default()).regime.is_bull());
    }

    #[test]
    fn defense_sub_rule_is_exhaustive() {
        let params = ClassifierParams::default();
        let cases = [
            (Some(0.1), Some(0.1), Regime::DefenseMix),
            (Some(-0.1), Some(0.1), Regime::DefenseBond),
            (Some(0.1), Some(-0.1), Regime::DefenseCash),
            (Some(-0.1), Some(-0.1), Regime::DefenseCash),
            (None, None, Regime::DefenseCash),
            (Some(0.0), Some(0.0), Regime::DefenseCash),
        ];
        for (cash, bond, expected) in cases {
            let d = decide(&risk_off(cash, bond), &params);
            assert_eq!(d.regime, expected, "cash={cash:?} bond={bond:?}");
            assert_sums_to_one(&d);
        }
    }

    #[test]
    fn defense_mix_is_fifty_fifty() {
        let d = decide(&risk_off(Some(0.1), Some(0.2)), &ClassifierParams::default());
        assert!((d.weights.get(Role::DefenseCash) - 0.5).abs() < 1e-12);
        assert!((d.weights.get(Role::DefenseBond) - 0.5).abs() < 1e-12);
        assert!(!d.hedged);
    }

    #[test]
    fn partial_hedge_keeps_base_share_in_defense() {
        let params = ClassifierParams {
            partial_hedge: 0.2,
            ..ClassifierParams::default()
        };
        let d = decide(&risk_off(Some(0.1), Some(0.2)), &params);
        assert!(d.hedged);
        assert!((d.weights.get(Role::Base) - 0.2).abs() < 1e-12);
        assert!((d.weights.get(Role::DefenseCash) - 0.4).abs() < 1e-12);
        assert!((d.weights.get(Role::DefenseBond) - 0.4).abs() < 1e-12);
        assert_sums_to_one(&d);
    }

    #[test]
    fn canary_never_carries_weight() {
        let params = ClassifierParams::default();
        for signals in [risk_on(), risk_off(Some(1.0), None), RegimeSignals::default()] {
            assert_eq!(decide(&signals, &params).weights.get(Role::Canary), 0.0);
        }
    }

    fn flat_store(days: usize) -> PriceSeriesStore {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let roles = RoleAssignment::default();
        let series = roles
            .instruments()
            .into_iter()
            .map(|id| {
                let closes: Vec<_> = (0..days)
                    .map(|i| (start + chrono::Duration::days(i as i64), 100.0))
                    .collect();
                PriceSeries::from_closes(id, &closes)
            })
            .collect();
        PriceSeriesStore::new(series).unwrap()
    }

    #[test]
    fn flat_prices_never_classify_bull() {
        let store = flat_store(300);
        let classifier = RegimeClassifier::new(
            &store,
            &RoleAssignment::default(),
            &MomentumScorer::default(),
            120,
            ClassifierParams::default(),
            NonZeroUsize::MIN,
        )
        .unwrap();

        for idx in 0..store.len() {
            let d = classifier.classify(idx);
            assert_eq!(d.regime, Regime::DefenseCash, "idx {idx}");
        }
    }

    #[test]
    fn classify_reads_the_lagged_close() {
        // Base rallies only on the last day; canary always trending.
        let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let date = |i: usize| start + chrono::Duration::days(i as i64);
        let mut series = Vec::new();
        for id in ["SSO", "BIL", "IEF"] {
            let closes: Vec<_> = (0..6).map(|i| (date(i), 100.0)).collect();
            series.push(PriceSeries::from_closes(id, &closes));
        }
        let tip: Vec<_> = (0..6).map(|i| (date(i), 100.0 + i as f64)).collect();
        series.push(PriceSeries::from_closes("TIP", &tip));
        let spy: Vec<_> = (0..6)
            .map(|i| (date(i), if i == 5 { 120.0 } else { 100.0 }))
            .collect();
        series.push(PriceSeries::from_closes("SPY", &spy));
        let store = PriceSeriesStore::new(series).unwrap();

        let classifier = RegimeClassifier::new(
            &store,
            &RoleAssignment::default(),
            &MomentumScorer::new(vec![Horizon::new(1, 1.0)]),
            2,
            ClassifierParams::default(),
            NonZeroUsize::MIN,
        )
        .unwrap();

        // Day 5's rally is visible only from day 6 on, which does not exist.
        assert_eq!(classifier.classify(5).regime, Regime::DefenseCash);
        let (last, latest) = classifier.classify_latest().unwrap();
        assert_eq!(last, 5);
        assert_eq!(latest.regime, Regime::BullAggressive);
    }

    #[test]
    fn classify_before_lag_uses_no_signals() {
        let store = flat_store(5);
        let classifier = RegimeClassifier::new(
            &store,
            &RoleAssignment::default(),
            &MomentumScorer::default(),
            3,
            ClassifierParams {
                partial_hedge: 0.5,
                ..ClassifierParams::default()
            },
            NonZeroUsize::new(2).unwrap(),
        )
        .unwrap();

        assert_eq!(classifier.decision_lag(), 2);
        let d = classifier.classify(1);
        assert_eq!(d.regime, Regime::DefenseCash);
        assert!((d.weights.get(Role::Base) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_role_instrument_is_reported() {
        let store = flat_store(5);
        let roles = RoleAssignment {
            canary: "VWO".into(),
            ..RoleAssignment::default()
        };
        let err = RegimeClassifier::new(
            &store,
            &roles,
            &MomentumScorer::default(),
            3,
            ClassifierParams::default(),
            NonZeroUsize::MIN,
        )
        .unwrap_err();
        assert!(matches!(err, RegimeTraderError::UnknownInstrument { instrument } if instrument == "VWO"));
    }
}
