//! Daily backtest loop.
//!
//! One fold over the trading days of the simulation window. Each day after
//! the anchor day runs, in order:
//!
//! 1. year boundary: tax on last year's capital change, paid from the
//!    previous close;
//! 2. classify from signals `decision_lag` closes back;
//! 3. rebalance on a regime change or calendar boundary, fee first;
//! 4. apply the day's per-role returns and renormalize weights;
//! 5. record equity.
//!
//! The benchmark is stepped through the same days alongside.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use super::benchmark::{BenchmarkResult, BenchmarkTracker};
use super::config::SimulationConfig;
use super::config_validation::validate_simulation_config;
use super::error::RegimeTraderError;
use super::metrics::{Metrics, PeriodReturn, monthly_returns, yearly_returns};
use super::portfolio::{EquityPoint, Portfolio, RoleReturns};
use super::price_store::PriceSeriesStore;
use super::rebalance::{RebalanceTrigger, RebalancingScheduler};
use super::recommendation::Recommendation;
use super::regime::{Regime, RegimeClassifier};
use super::role::{Role, RoleAssignment, RoleWeights};
use super::tax::{TaxAccrualEngine, TaxEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// Nothing simulated yet; the next day is the anchor.
    Initializing,
    Running,
    Finalized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeLogEntry {
    pub date: NaiveDate,
    pub regime: Regime,
    pub trigger: RebalanceTrigger,
    pub weights: RoleWeights,
    /// Sum of absolute weight changes, before halving.
    pub turnover: f64,
    pub fee: f64,
    pub capital_after: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegimeChange {
    pub date: NaiveDate,
    pub from: Option<Regime>,
    pub to: Regime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub roles: RoleAssignment,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub final_weights: RoleWeights,
    pub final_regime: Option<Regime>,
    pub equity_curve: Vec<EquityPoint>,
    pub trade_log: Vec<TradeLogEntry>,
    pub tax_log: Vec<TaxEvent>,
    pub regime_history: Vec<RegimeChange>,
    pub metrics: Metrics,
    pub monthly_returns: Vec<PeriodReturn>,
    pub yearly_returns: Vec<PeriodReturn>,
    pub benchmark: BenchmarkResult,
    pub recommendation: Recommendation,
}

impl SimulationReport {
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.equity_curve.first().map(|p| p.date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.equity_curve.last().map(|p| p.date)
    }
}

/// Validates `config` and runs one backtest over `store`.
pub fn run_simulation(
    store: &PriceSeriesStore,
    config: &SimulationConfig,
) -> Result<SimulationReport, RegimeTraderError> {
    Ok(PortfolioSimulator::new(store, config)?.run())
}

pub struct PortfolioSimulator<'a> {
    store: &'a PriceSeriesStore,
    config: &'a SimulationConfig,
    classifier: RegimeClassifier,
    scheduler: RebalancingScheduler,
    tax: TaxAccrualEngine,
    columns: [usize; Role::COUNT],
    start: usize,
    end: usize,
    state: SimulationState,
    portfolio: Portfolio,
    benchmark: BenchmarkTracker,
    last_regime: Option<Regime>,
    prev_date: Option<NaiveDate>,
    trade_log: Vec<TradeLogEntry>,
    tax_log: Vec<TaxEvent>,
    regime_history: Vec<RegimeChange>,
}

impl<'a> PortfolioSimulator<'a> {
    pub fn new(
        store: &'a PriceSeriesStore,
        config: &'a SimulationConfig,
    ) -> Result<Self, RegimeTraderError> {
        validate_simulation_config(config)?;

        let mut columns = [0usize; Role::COUNT];
        for role in Role::ALL {
            columns[role.index()] = store.index_of(config.roles.instrument(role))?;
        }
        let benchmark = BenchmarkTracker::new(
            store,
            config.benchmark_instrument(),
            config.initial_capital,
            config.tax,
        )?;
        let (start, end) = simulation_window(store, config)?;

        Ok(PortfolioSimulator {
            store,
            config,
            classifier: RegimeClassifier::from_config(store, config)?,
            scheduler: RebalancingScheduler::new(config.cadence, config.fee_rate),
            tax: TaxAccrualEngine::new(config.tax, config.initial_capital),
            columns,
            start,
            end,
            state: SimulationState::Initializing,
            portfolio: Portfolio::new(config.initial_capital),
            benchmark,
            last_regime: None,
            prev_date: None,
            trade_log: Vec::new(),
            tax_log: Vec::new(),
            regime_history: Vec::new(),
        })
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Inclusive timeline indices of the first and last simulated day.
    pub fn window(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Simulates timeline index `idx`. Days must be fed in order.
    pub fn step(&mut self, idx: usize) {
        let Some(date) = self.store.date_at(idx) else {
            return;
        };

        match self.state {
            SimulationState::Finalized => return,
            SimulationState::Initializing => {
                self.state = SimulationState::Running;
            }
            SimulationState::Running => self.advance(idx, date),
        }

        self.portfolio.record_equity(date);
        self.benchmark.step(self.store, idx, date);
        self.prev_date = Some(date);
    }

    fn advance(&mut self, idx: usize, date: NaiveDate) {
        if let Some(prev) = self.prev_date {
            if prev.year() != date.year() {
                self.settle_year(date, prev.year());
            }
        }

        if !self.portfolio.is_exhausted() {
            self.rebalance_if_due(idx, date);
        }

        let returns = self.role_returns(idx);
        self.portfolio.apply_returns(date, &returns);
    }

    fn settle_year(&mut self, date: NaiveDate, tax_year: i32) {
        let before = self.portfolio.capital;
        let (after, event) = self.tax.settle_year(date, tax_year, before);
        self.portfolio.deduct(before - after);
        self.tax_log.extend(event);
    }

    fn rebalance_if_due(&mut self, idx: usize, date: NaiveDate) {
        let decision = self.classifier.classify(idx);

        if self.last_regime != Some(decision.regime) {
            self.regime_history.push(RegimeChange {
                date,
                from: self.last_regime,
                to: decision.regime,
            });
        }

        let trigger =
            self.scheduler
                .should_rebalance(self.last_regime, &decision, date, self.prev_date);
        self.last_regime = Some(decision.regime);

        let Some(trigger) = trigger else {
            return;
        };

        let turnover = self.portfolio.weights.turnover(&decision.weights);
        let fee = self
            .scheduler
            .cost(self.portfolio.capital, &self.portfolio.weights, &decision.weights);
        self.portfolio.rebalance(decision.weights, fee);

        debug!(
            %date,
            regime = %decision.regime,
            %trigger,
            turnover,
            fee,
            capital = self.portfolio.capital,
            "rebalanced"
        );

        self.trade_log.push(TradeLogEntry {
            date,
            regime: decision.regime,
            trigger,
            weights: decision.weights,
            turnover,
            fee,
            capital_after: self.portfolio.capital,
        });
    }

    /// Close-to-close return per role; a missing price is a zero return.
    fn role_returns(&self, idx: usize) -> RoleReturns {
        let mut returns = [0.0; Role::COUNT];
        for role in Role::HELD {
            returns[role.index()] = self
                .store
                .pct_change(self.columns[role.index()], idx)
                .unwrap_or(0.0);
        }
        returns
    }

    /// Runs every day of the window and builds the report.
    pub fn run(mut self) -> SimulationReport {
        info!(
            start = %self.store.dates()[self.start],
            end = %self.store.dates()[self.end],
            days = self.end - self.start + 1,
            initial_capital = self.config.initial_capital,
            "simulation started"
        );
        for idx in self.start..=self.end {
            self.step(idx);
        }
        self.finish()
    }

    pub fn finish(mut self) -> SimulationReport {
        self.state = SimulationState::Finalized;
        let config = self.config;

        let total_fees = self.trade_log.iter().map(|t| t.fee).sum();
        let total_taxes = self.tax_log.iter().map(|t| t.tax).sum();
        let metrics = Metrics::compute(
            &self.portfolio.equity_curve,
            config.initial_capital,
            config.risk_free_rate,
        )
        .with_costs(total_fees, total_taxes, self.trade_log.len());

        // Reads the newest close in the store, even past an earlier end date.
        let (latest, decision) = self
            .classifier
            .classify_latest()
            .unwrap_or_else(|| (self.end, self.classifier.classify_close(self.end)));
        let recommendation = Recommendation::new(
            self.store.dates()[latest],
            &decision,
            &config.roles,
            self.last_regime,
        );

        info!(
            final_capital = self.portfolio.capital,
            cagr = metrics.cagr,
            max_drawdown = metrics.max_drawdown,
            rebalances = metrics.rebalance_count,
            "simulation finished"
        );

        SimulationReport {
            roles: config.roles.clone(),
            initial_capital: config.initial_capital,
            final_capital: self.portfolio.capital,
            final_weights: self.portfolio.weights,
            final_regime: self.last_regime,
            monthly_returns: monthly_returns(&self.portfolio.equity_curve),
            yearly_returns: yearly_returns(&self.portfolio.equity_curve),
            equity_curve: self.portfolio.equity_curve,
            trade_log: self.trade_log,
            tax_log: self.tax_log,
            regime_history: self.regime_history,
            metrics,
            benchmark: self.benchmark.finish(config.risk_free_rate),
            recommendation,
        }
    }
}

/// Resolves the simulated index range. Without a start date the run begins
/// on the first day every required instrument has a close.
fn simulation_window(
    store: &PriceSeriesStore,
    config: &SimulationConfig,
) -> Result<(usize, usize), RegimeTraderError> {
    let mut columns = Vec::new();
    for instrument in config.required_instruments() {
        columns.push(store.index_of(&instrument)?);
    }
    let covered = (0..store.len())
        .find(|&idx| columns.iter().all(|&col| store.price(col, idx).is_some()))
        .ok_or(RegimeTraderError::EmptyWindow)?;

    let requested = match config.start_date {
        Some(date) => store
            .first_index_on_or_after(date)
            .ok_or(RegimeTraderError::EmptyWindow)?,
        None => 0,
    };
    let start = requested.max(covered);

    let end = match config.end_date {
        Some(date) => store
            .last_index_on_or_before(date)
            .ok_or(RegimeTraderError::EmptyWindow)?,
        None => store.len() - 1,
    };

    if start > end {
        return Err(RegimeTraderError::EmptyWindow);
    }
    Ok((start, end))
}
