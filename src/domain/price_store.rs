//! Aligned, forward-filled price table shared by every component of a run.
//!
//! All instruments are laid on one unified timeline (the union of their
//! trading dates). A date on which an instrument has no observation carries
//! the previous close forward; dates before an instrument's first close stay
//! empty. The store is immutable after construction, so concurrent runs can
//! share it by reference.

use crate::domain::error::RegimeTraderError;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct PriceSeriesStore {
    instruments: Vec<String>,
    instrument_index: HashMap<String, usize>,
    dates: Vec<NaiveDate>,
    date_index: HashMap<NaiveDate, usize>,
    closes: Vec<Vec<Option<f64>>>,
}

impl PriceSeriesStore {
    pub fn new(series: Vec<PriceSeries>) -> Result<Self, RegimeTraderError> {
        if series.is_empty() {
            return Err(RegimeTraderError::PriceData {
                reason: "no instruments supplied".into(),
            });
        }

        let mut instrument_index = HashMap::with_capacity(series.len());
        for (i, s) in series.iter().enumerate() {
            if s.is_empty() {
                return Err(RegimeTraderError::NoData {
                    instrument: s.instrument.clone(),
                });
            }
            if instrument_index.insert(s.instrument.clone(), i).is_some() {
                return Err(RegimeTraderError::PriceData {
                    reason: format!("instrument {} supplied twice", s.instrument),
                });
            }
        }

        let dates = build_unified_timeline(&series);
        let date_index: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();

        let closes = series
            .iter()
            .map(|s| forward_fill(s, &dates, &date_index))
            .collect();

        Ok(PriceSeriesStore {
            instruments: series.into_iter().map(|s| s.instrument).collect(),
            instrument_index,
            dates,
            date_index,
            closes,
        })
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn index_of(&self, instrument: &str) -> Result<usize, RegimeTraderError> {
        self.instrument_index
            .get(instrument)
            .copied()
            .ok_or_else(|| RegimeTraderError::UnknownInstrument {
                instrument: instrument.to_string(),
            })
    }

    pub fn date_at(&self, idx: usize) -> Option<NaiveDate> {
        self.dates.get(idx).copied()
    }

    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    /// First timeline index whose date is `>= date`.
    pub fn first_index_on_or_after(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.dates.partition_point(|&d| d < date);
        (idx < self.dates.len()).then_some(idx)
    }

    /// Last timeline index whose date is `<= date`.
    pub fn last_index_on_or_before(&self, date: NaiveDate) -> Option<usize> {
        self.dates.partition_point(|&d| d <= date).checked_sub(1)
    }

    pub fn price(&self, instrument: usize, idx: usize) -> Option<f64> {
        self.closes
            .get(instrument)
            .and_then(|col| col.get(idx))
            .copied()
            .flatten()
    }

    pub fn price_on(&self, instrument: usize, date: NaiveDate) -> Option<f64> {
        self.date_index(date).and_then(|idx| self.price(instrument, idx))
    }

    /// Fractional change from the previous timeline date to `idx`.
    pub fn pct_change(&self, instrument: usize, idx: usize) -> Option<f64> {
        self.trailing_return(instrument, idx, 1)
    }

    pub fn pct_change_series(&self, instrument: usize) -> Vec<Option<f64>> {
        (0..self.len())
            .map(|idx| self.pct_change(instrument, idx))
            .collect()
    }

    /// Fractional change over the trailing `lookback` trading days ending at
    /// `idx`. Absent when fewer than `lookback + 1` observations exist.
    pub fn trailing_return(&self, instrument: usize, idx: usize, lookback: usize) -> Option<f64> {
        let start = idx.checked_sub(lookback)?;
        let prev = self.price(instrument, start)?;
        let curr = self.price(instrument, idx)?;
        Some(curr / prev - 1.0)
    }
}

pub fn build_unified_timeline(series: &[PriceSeries]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points().iter().map(|p| p.date))
        .collect();
    unique_dates.into_iter().collect()
}

fn forward_fill(
    series: &PriceSeries,
    dates: &[NaiveDate],
    date_index: &HashMap<NaiveDate, usize>,
) -> Vec<Option<f64>> {
    let mut raw: Vec<Option<f64>> = vec![None; dates.len()];
    for point in series.points() {
        if let Some(&i) = date_index.get(&point.date) {
            raw[i] = Some(point.close);
        }
    }

    let mut last = None;
    for slot in raw.iter_mut() {
        match *slot {
            Some(close) => last = Some(close),
            None => *slot = last,
        }
    }
    raw
}
