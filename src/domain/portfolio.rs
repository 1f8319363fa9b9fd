//! Portfolio state: capital, role weights and the equity curve.

use chrono::NaiveDate;
use tracing::warn;

use super::role::{Role, RoleWeights};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Daily return per role, indexed by `Role::index`.
pub type RoleReturns = [f64; Role::COUNT];

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub capital: f64,
    pub initial_capital: f64,
    pub weights: RoleWeights,
    pub equity_curve: Vec<EquityPoint>,
    exhausted: bool,
}

impl Portfolio {
    /// Starts fully in the defensive cash role.
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            capital: initial_capital,
            initial_capital,
            weights: RoleWeights::single(Role::DefenseCash),
            equity_curve: Vec::new(),
            exhausted: false,
        }
    }

    /// Capital hit zero; the portfolio stays all cash from here on.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Pays `fee` out of capital, then adopts `target`.
    pub fn rebalance(&mut self, target: RoleWeights, fee: f64) {
        if self.exhausted {
            return;
        }
        self.capital = (self.capital - fee).max(0.0);
        self.weights = target;
    }

    pub fn deduct(&mut self, amount: f64) {
        self.capital = (self.capital - amount).max(0.0);
    }

    /// Grows each role's value by its return and renormalizes weights from
    /// the realized values. Returns `true` when this call exhausted capital.
    pub fn apply_returns(&mut self, date: NaiveDate, returns: &RoleReturns) -> bool {
        if self.exhausted {
            return false;
        }

        let mut values = RoleWeights::zero();
        for (role, weight) in self.weights.iter() {
            values.set(role, self.capital * weight * (1.0 + returns[role.index()]));
        }
        let total = values.sum();

        if !total.is_finite() || total <= 0.0 {
            warn!(%date, capital = total, "capital exhausted, moving to cash");
            self.capital = 0.0;
            self.weights = RoleWeights::single(Role::DefenseCash);
            self.exhausted = true;
            return true;
        }

        self.weights = values.scaled(1.0 / total);
        self.capital = total;
        false
    }

    pub fn record_equity(&mut self, date: NaiveDate) {
        self.equity_curve.push(EquityPoint {
            date,
            equity: self.capital,
        });
    }
}
