#![allow(dead_code)]

use chrono::NaiveDate;
use regimetrader::domain::config::SimulationConfig;
use regimetrader::domain::error::RegimeTraderError;
use regimetrader::domain::momentum::Horizon;
use regimetrader::domain::price_series::PriceSeries;
use regimetrader::domain::price_store::PriceSeriesStore;
use regimetrader::domain::tax::TaxConfig;
use regimetrader::ports::data_port::PriceDataPort;
use std::collections::HashMap;

pub const DEFAULT_INSTRUMENTS: [&str; 5] = ["SPY", "SSO", "BIL", "IEF", "TIP"];

pub struct MockPriceDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.data.insert(series.instrument.clone(), series);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors.insert(instrument.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_closes(&self, instrument: &str) -> Result<PriceSeries, RegimeTraderError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(RegimeTraderError::PriceData {
                reason: reason.clone(),
            });
        }
        self.data
            .get(instrument)
            .cloned()
            .ok_or_else(|| RegimeTraderError::NoData {
                instrument: instrument.to_string(),
            })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One close per calendar day starting at `start`.
pub fn daily_series(id: &str, start: NaiveDate, closes: &[f64]) -> PriceSeries {
    let points: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| (start + chrono::Duration::days(i as i64), c))
        .collect();
    PriceSeries::from_closes(id, &points)
}

pub fn flat(days: usize) -> Vec<f64> {
    vec![100.0; days]
}

/// Compounding path: `rate` per day.
pub fn trending(days: usize, rate: f64) -> Vec<f64> {
    (0..days).map(|i| 100.0 * (1.0 + rate).powi(i as i32)).collect()
}

/// Closes for the five default roles (SPY, SSO, BIL, IEF, TIP).
pub struct Market {
    pub spy: Vec<f64>,
    pub sso: Vec<f64>,
    pub bil: Vec<f64>,
    pub ief: Vec<f64>,
    pub tip: Vec<f64>,
}

impl Market {
    pub fn flat(days: usize) -> Self {
        Market {
            spy: flat(days),
            sso: flat(days),
            bil: flat(days),
            ief: flat(days),
            tip: flat(days),
        }
    }

    pub fn series(&self, start: NaiveDate) -> Vec<PriceSeries> {
        [
            ("SPY", &self.spy),
            ("SSO", &self.sso),
            ("BIL", &self.bil),
            ("IEF", &self.ief),
            ("TIP", &self.tip),
        ]
        .iter()
        .map(|(id, closes)| daily_series(id, start, closes))
        .collect()
    }

    pub fn store(&self, start: NaiveDate) -> PriceSeriesStore {
        PriceSeriesStore::new(self.series(start)).unwrap()
    }

    pub fn port(&self, start: NaiveDate) -> MockPriceDataPort {
        self.series(start)
            .into_iter()
            .fold(MockPriceDataPort::new(), |port, s| port.with_series(s))
    }
}

/// Short lookbacks so a few days of history are enough to classify.
pub fn fast_config() -> SimulationConfig {
    SimulationConfig {
        initial_capital: 1_000_000.0,
        horizons: vec![Horizon::new(1, 1.0)],
        ma_window: 2,
        tax: TaxConfig {
            enabled: false,
            ..TaxConfig::default()
        },
        ..SimulationConfig::default()
    }
}
