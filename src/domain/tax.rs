//! Year-boundary capital gains tax accrual.
//!
//! This is a mark-to-market approximation: the taxable base is the change in
//! total capital over the calendar year (fees and price moves included),
//! not realized gains on closed lots. It is applied once, on the first
//! trading day of the following year.

use chrono::NaiveDate;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxConfig {
    pub enabled: bool,
    /// Annual gain exempt from tax, in currency units.
    pub deduction: f64,
    pub rate: f64,
}

impl Default for TaxConfig {
    fn default() -> Self {
        TaxConfig {
            enabled: true,
            deduction: 2_500_000.0,
            rate: 0.22,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxEvent {
    /// First trading day of the new year, when the tax is paid.
    pub date: NaiveDate,
    pub tax_year: i32,
    pub year_gain: f64,
    pub taxable_base: f64,
    pub tax: f64,
}

/// tax = max(0, year_gain - deduction) * rate
pub fn accrue(year_gain: f64, deduction: f64, rate: f64) -> f64 {
    (year_gain - deduction).max(0.0) * rate
}

/// Per-simulation tax accumulator. Strategy and benchmark each own one.
#[derive(Debug, Clone)]
pub struct TaxAccrualEngine {
    config: TaxConfig,
    year_start_capital: f64,
}

impl TaxAccrualEngine {
    pub fn new(config: TaxConfig, initial_capital: f64) -> Self {
        TaxAccrualEngine {
            config,
            year_start_capital: initial_capital,
        }
    }

    /// Closes `tax_year` given the capital at its last close. Returns the
    /// capital after tax and the event when tax is owed; the accumulator
    /// restarts from the post-tax capital.
    pub fn settle_year(
        &mut self,
        date: NaiveDate,
        tax_year: i32,
        capital: f64,
    ) -> (f64, Option<TaxEvent>) {
        let year_gain = capital - self.year_start_capital;
        let mut event = None;
        let mut after = capital;

        if self.config.enabled {
            let tax = accrue(year_gain, self.config.deduction, self.config.rate);
            if tax > 0.0 {
                after = (capital - tax).max(0.0);
                debug!(%date, tax_year, year_gain, tax, "tax accrued");
                event = Some(TaxEvent {
                    date,
                    tax_year,
                    year_gain,
                    taxable_base: year_gain - self.config.deduction,
                    tax,
                });
            }
        }

        self.year_start_capital = after;
        (after, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan2(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, 2).unwrap()
    }

    #[test]
    fn accrue_above_deduction() {
        let tax = accrue(3_000_000.0, 2_500_000.0, 0.22);
        assert!((tax - 110_000.0).abs() < 1e-6);
    }

    #[test]
    fn accrue_below_or_at_deduction_is_zero() {
        assert_eq!(accrue(2_500_000.0, 2_500_000.0, 0.22), 0.0);
        assert_eq!(accrue(1_000.0, 2_500_000.0, 0.22), 0.0);
        assert_eq!(accrue(-5_000_000.0, 2_500_000.0, 0.22), 0.0);
    }

    #[test]
    fn settle_year_deducts_and_resets() {
        let mut engine = TaxAccrualEngine::new(TaxConfig::default(), 100_000_000.0);
        let (after, event) = engine.settle_year(jan2(2021), 2020, 103_000_000.0);

        let event = event.unwrap();
        assert_eq!(event.tax_year, 2020);
        assert!((event.year_gain - 3_000_000.0).abs() < 1e-6);
        assert!((event.taxable_base - 500_000.0).abs() < 1e-6);
        assert!((event.tax - 110_000.0).abs() < 1e-6);
        assert!((after - 102_890_000.0).abs() < 1e-6);
        assert!((engine.year_start_capital - after).abs() < f64::EPSILON);
    }

    #[test]
    fn no_event_when_gain_within_deduction() {
        let mut engine = TaxAccrualEngine::new(TaxConfig::default(), 100_000_000.0);
        let (after, event) = engine.settle_year(jan2(2021), 2020, 102_000_000.0);
        assert!(event.is_none());
        assert_eq!(after, 102_000_000.0);
        assert_eq!(engine.year_start_capital, 102_000_000.0);
    }

    #[test]
    fn loss_year_then_gain_year_taxes_only_the_new_gain() {
        let mut engine = TaxAccrualEngine::new(TaxConfig::default(), 100_000_000.0);
        let (_, first) = engine.settle_year(jan2(2021), 2020, 90_000_000.0);
        assert!(first.is_none());

        let (_, second) = engine.settle_year(jan2(2022), 2021, 93_500_000.0);
        let second = second.unwrap();
        assert!((second.year_gain - 3_500_000.0).abs() < 1e-6);
        assert!((second.tax - 220_000.0).abs() < 1e-6);
    }

    #[test]
    fn disabled_tax_still_resets_accumulator() {
        let config = TaxConfig {
            enabled: false,
            ..TaxConfig::default()
        };
        let mut engine = TaxAccrualEngine::new(config, 100.0);
        let (after, event) = engine.settle_year(jan2(2021), 2020, 1_000_000_000.0);
        assert!(event.is_none());
        assert_eq!(after, 1_000_000_000.0);
        assert_eq!(engine.year_start_capital, 1_000_000_000.0);
    }
}
