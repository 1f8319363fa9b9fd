//! Instrument roles and role-indexed weight vectors.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Base,
    Leveraged,
    DefenseCash,
    DefenseBond,
    /// Signal only; never carries weight.
    Canary,
}

impl Role {
    pub const COUNT: usize = 5;

    pub const ALL: [Role; Role::COUNT] = [
        Role::Base,
        Role::Leveraged,
        Role::DefenseCash,
        Role::DefenseBond,
        Role::Canary,
    ];

    /// Roles that may carry portfolio weight.
    pub const HELD: [Role; 4] = [
        Role::Base,
        Role::Leveraged,
        Role::DefenseCash,
        Role::DefenseBond,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// INI key under `[instruments]`.
    pub const fn config_key(self) -> &'static str {
        match self {
            Role::Base => "base",
            Role::Leveraged => "leveraged",
            Role::DefenseCash => "defense_cash",
            Role::DefenseBond => "defense_bond",
            Role::Canary => "canary",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// Fraction of capital per role.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoleWeights([f64; Role::COUNT]);

impl RoleWeights {
    pub fn zero() -> Self {
        RoleWeights([0.0; Role::COUNT])
    }

    pub fn single(role: Role) -> Self {
        let mut w = Self::zero();
        w.set(role, 1.0);
        w
    }

    pub fn from_pairs(pairs: &[(Role, f64)]) -> Self {
        let mut w = Self::zero();
        for &(role, weight) in pairs {
            w.add(role, weight);
        }
        w
    }

    pub fn get(&self, role: Role) -> f64 {
        self.0[role.index()]
    }

    pub fn set(&mut self, role: Role, weight: f64) {
        self.0[role.index()] = weight;
    }

    pub fn add(&mut self, role: Role, weight: f64) {
        self.0[role.index()] += weight;
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = *self;
        for w in out.0.iter_mut() {
            *w *= factor;
        }
        out
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Roles with a non-zero weight, in role order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, f64)> + '_ {
        Role::ALL
            .iter()
            .map(move |&role| (role, self.get(role)))
            .filter(|&(_, w)| w != 0.0)
    }

    /// Sum of absolute weight differences (round-trip turnover).
    pub fn turnover(&self, other: &RoleWeights) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .sum()
    }
}

impl fmt::Display for RoleWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(role, w)| format!("{}={:.1}%", role, w * 100.0))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Concrete instrument identifier per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub base: String,
    pub leveraged: String,
    pub defense_cash: String,
    pub defense_bond: String,
    pub canary: String,
}

impl RoleAssignment {
    pub fn instrument(&self, role: Role) -> &str {
        match role {
            Role::Base => &self.base,
            Role::Leveraged => &self.leveraged,
            Role::DefenseCash => &self.defense_cash,
            Role::DefenseBond => &self.defense_bond,
            Role::Canary => &self.canary,
        }
    }

    /// Distinct instrument identifiers in role order.
    pub fn instruments(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(Role::COUNT);
        for role in Role::ALL {
            let id = self.instrument(role);
            if !out.iter().any(|existing| existing == id) {
                out.push(id.to_string());
            }
        }
        out
    }
}

impl Default for RoleAssignment {
    fn default() -> Self {
        RoleAssignment {
            base: "SPY".into(),
            leveraged: "SSO".into(),
            defense_cash: "BIL".into(),
            defense_bond: "IEF".into(),
            canary: "TIP".into(),
        }
    }
}
