//! Buy-and-hold reference run over the same window as the strategy.

use chrono::{Datelike, NaiveDate};

use super::error::RegimeTraderError;
use super::metrics::Metrics;
use super::portfolio::EquityPoint;
use super::price_store::PriceSeriesStore;
use super::tax::{TaxAccrualEngine, TaxConfig, TaxEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    pub instrument: String,
    pub equity_curve: Vec<EquityPoint>,
    pub tax_log: Vec<TaxEvent>,
    pub final_capital: f64,
    pub metrics: Metrics,
}

/// Holds 100% of one instrument with its own capital and tax accumulator.
/// No rebalancing, so no fees.
#[derive(Debug, Clone)]
pub struct BenchmarkTracker {
    instrument: String,
    column: usize,
    initial_capital: f64,
    capital: f64,
    tax: TaxAccrualEngine,
    prev_date: Option<NaiveDate>,
    equity_curve: Vec<EquityPoint>,
    tax_log: Vec<TaxEvent>,
}

impl BenchmarkTracker {
    pub fn new(
        store: &PriceSeriesStore,
        instrument: &str,
        initial_capital: f64,
        tax: TaxConfig,
    ) -> Result<Self, RegimeTraderError> {
        Ok(BenchmarkTracker {
            instrument: instrument.to_string(),
            column: store.index_of(instrument)?,
            initial_capital,
            capital: initial_capital,
            tax: TaxAccrualEngine::new(tax, initial_capital),
            prev_date: None,
            equity_curve: Vec::new(),
            tax_log: Vec::new(),
        })
    }

    /// Advances one trading day. The first call only anchors the curve.
    pub fn step(&mut self, store: &PriceSeriesStore, idx: usize, date: NaiveDate) {
        if let Some(prev) = self.prev_date {
            if prev.year() != date.year() {
                let (after, event) = self.tax.settle_year(date, prev.year(), self.capital);
                self.capital = after;
                self.tax_log.extend(event);
            }
            let ret = store.pct_change(self.column, idx).unwrap_or(0.0);
            self.capital = (self.capital * (1.0 + ret)).max(0.0);
        }
        self.equity_curve.push(EquityPoint {
            date,
            equity: self.capital,
        });
        self.prev_date = Some(date);
    }

    pub fn finish(self, risk_free_rate: f64) -> BenchmarkResult {
        let total_taxes = self.tax_log.iter().map(|t| t.tax).sum();
        let metrics = Metrics::compute(&self.equity_curve, self.initial_capital, risk_free_rate)
            .with_costs(0.0, total_taxes, 0);
        BenchmarkResult {
            instrument: self.instrument,
            final_capital: self.capital,
            equity_curve: self.equity_curve,
            tax_log: self.tax_log,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_series::PriceSeries;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn run(store: &PriceSeriesStore, tax: TaxConfig, capital: f64) -> BenchmarkResult {
        let mut tracker = BenchmarkTracker::new(store, "SPY", capital, tax).unwrap();
        for (idx, &date) in store.dates().iter().enumerate() {
            tracker.step(store, idx, date);
        }
        tracker.finish(0.0)
    }

    #[test]
    fn tracks_price_ratio_without_tax() {
        let spy = PriceSeries::from_closes(
            "SPY",
            &[(d(2024, 1, 2), 100.0), (d(2024, 1, 3), 110.0), (d(2024, 1, 4), 99.0)],
        );
        let store = PriceSeriesStore::new(vec![spy]).unwrap();
        let result = run(&store, TaxConfig::default(), 1_000.0);

        let equity: Vec<f64> = result.equity_curve.iter().map(|p| p.equity).collect();
        assert_relative_eq!(equity[0], 1_000.0);
        assert_relative_eq!(equity[1], 1_100.0, epsilon = 1e-9);
        assert_relative_eq!(equity[2], 990.0, epsilon = 1e-9);
        assert!(result.tax_log.is_empty());
        assert_eq!(result.metrics.rebalance_count, 0);
    }

    #[test]
    fn taxes_gain_at_year_boundary() {
        let spy = PriceSeries::from_closes(
            "SPY",
            &[(d(2020, 12, 30), 100.0), (d(2020, 12, 31), 103.0), (d(2021, 1, 4), 103.0)],
        );
        let store = PriceSeriesStore::new(vec![spy]).unwrap();
        let result = run(&store, TaxConfig::default(), 100_000_000.0);

        assert_eq!(result.tax_log.len(), 1);
        let event = &result.tax_log[0];
        assert_eq!(event.tax_year, 2020);
        assert_eq!(event.date, d(2021, 1, 4));
        assert_relative_eq!(event.tax, 110_000.0, epsilon = 1e-6);
        assert_relative_eq!(result.final_capital, 102_890_000.0, epsilon = 1e-6);
        assert_relative_eq!(result.metrics.total_taxes, 110_000.0, epsilon = 1e-6);
    }

    #[test]
    fn unknown_instrument_is_an_error() {
        let spy = PriceSeries::from_closes("SPY", &[(d(2024, 1, 2), 100.0)]);
        let store = PriceSeriesStore::new(vec![spy]).unwrap();
        assert!(matches!(
            BenchmarkTracker::new(&store, "QQQ", 1.0, TaxConfig::default()),
            Err(RegimeTraderError::UnknownInstrument { .. })
        ));
    }
}
