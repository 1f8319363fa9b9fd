//! Performance metrics and period return tables.

use super::portfolio::EquityPoint;
use chrono::{Datelike, NaiveDate};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Deepest decline from a running peak, as a non-positive fraction.
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub total_fees: f64,
    pub total_taxes: f64,
    pub rebalance_count: usize,
}

impl Metrics {
    pub fn compute(equity_curve: &[EquityPoint], initial_capital: f64, risk_free_rate: f64) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve, daily_rf);

        Metrics {
            total_return,
            cagr: cagr(initial_capital, final_equity, equity_curve.len()),
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_fees: 0.0,
            total_taxes: 0.0,
            rebalance_count: 0,
        }
    }

    pub fn with_costs(mut self, total_fees: f64, total_taxes: f64, rebalance_count: usize) -> Self {
        self.total_fees = total_fees;
        self.total_taxes = total_taxes;
        self.rebalance_count = rebalance_count;
        self
    }
}

/// (final / initial)^(252 / days) - 1
pub fn cagr(initial: f64, final_equity: f64, days: usize) -> f64 {
    if days == 0 || initial <= 0.0 {
        return 0.0;
    }
    let growth = final_equity / initial;
    if !growth.is_finite() || growth < 0.0 {
        return 0.0;
    }
    growth.powf(TRADING_DAYS_PER_YEAR / days as f64) - 1.0
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (point.equity - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev > 0.0 { (curr - prev) / prev } else { 0.0 }
        })
        .collect()
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    let returns = daily_returns(equity_curve);
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}

/// Return of one calendar month (`month` set) or year (`month` none).
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReturn {
    pub year: i32,
    pub month: Option<u32>,
    pub value: f64,
}

pub fn monthly_returns(equity_curve: &[EquityPoint]) -> Vec<PeriodReturn> {
    period_returns(equity_curve, |d| (d.year(), Some(d.month())))
}

pub fn yearly_returns(equity_curve: &[EquityPoint]) -> Vec<PeriodReturn> {
    period_returns(equity_curve, |d| (d.year(), None))
}

/// Each period is measured from the previous period's last equity, the
/// first period from the first equity of the curve.
fn period_returns<F>(equity_curve: &[EquityPoint], key: F) -> Vec<PeriodReturn>
where
    F: Fn(NaiveDate) -> (i32, Option<u32>),
{
    let Some(first) = equity_curve.first() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut reference = first.equity;
    let mut current = key(first.date);
    let mut last_equity = first.equity;

    let close = |period: (i32, Option<u32>), end: f64, start: f64| PeriodReturn {
        year: period.0,
        month: period.1,
        value: if start > 0.0 { end / start - 1.0 } else { 0.0 },
    };

    for point in &equity_curve[1..] {
        let period = key(point.date);
        if period != current {
            out.push(close(current, last_equity, reference));
            reference = last_equity;
            current = period;
        }
        last_equity = point.equity;
    }
    out.push(close(current, last_equity, reference));
    out
}
