//! CSV file price adapter.
//!
//! One file per instrument, `<dir>/<INSTRUMENT>.csv`, with a header row
//! naming a `date` column and a `close` column (`adj_close` when there is
//! no `close`). Other columns are ignored.

use crate::domain::error::RegimeTraderError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str) -> PathBuf {
        self.base_path.join(format!("{instrument}.csv"))
    }
}

fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

impl PriceDataPort for CsvPriceAdapter {
    fn fetch_closes(&self, instrument: &str) -> Result<PriceSeries, RegimeTraderError> {
        let path = self.csv_path(instrument);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RegimeTraderError::NoData {
                instrument: instrument.to_string(),
            },
            ErrorKind::InvalidData => RegimeTraderError::PriceData {
                reason: format!("{}: not valid UTF-8 text", path.display()),
            },
            _ => RegimeTraderError::Io(e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| RegimeTraderError::PriceData {
                reason: format!("{}: CSV header error: {}", path.display(), e),
            })?
            .clone();

        let date_col = column(&headers, &["date"]).ok_or_else(|| RegimeTraderError::PriceData {
            reason: format!("{}: missing date column", path.display()),
        })?;
        let close_col = column(&headers, &["close", "adj_close", "adj close"]).ok_or_else(|| {
            RegimeTraderError::PriceData {
                reason: format!("{}: missing close column", path.display()),
            }
        })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| RegimeTraderError::PriceData {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                RegimeTraderError::PriceData {
                    reason: format!("{}: invalid date '{}': {}", path.display(), date_str, e),
                }
            })?;

            match record.get(close_col).map(str::trim).and_then(|s| s.parse::<f64>().ok()) {
                Some(close) => points.push(PricePoint { date, close }),
                None => warn!(instrument, %date, "unparsable close, treating as gap"),
            }
        }

        let series = PriceSeries::new(instrument, points);
        debug!(
            instrument,
            rows = series.len(),
            first = ?series.first_date(),
            last = ?series.last_date(),
            path = %path.display(),
            "loaded closes"
        );
        Ok(series)
    }
}
