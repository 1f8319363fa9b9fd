//! Daily close series for a single instrument.

use chrono::NaiveDate;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closes for one instrument, strictly increasing by date.
///
/// Construction sorts the input, keeps the last observation for a repeated
/// date and drops closes that are not finite and positive. Dropped closes
/// become gaps that the store forward-fills.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub instrument: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(instrument: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        let instrument = instrument.into();
        points.sort_by_key(|p| p.date);

        let mut cleaned: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            if !point.close.is_finite() || point.close <= 0.0 {
                warn!(
                    instrument = %instrument,
                    date = %point.date,
                    close = point.close,
                    "dropping non-positive close"
                );
                continue;
            }
            match cleaned.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => cleaned.push(point),
            }
        }

        PriceSeries {
            instrument,
            points: cleaned,
        }
    }

    pub fn from_closes(instrument: impl Into<String>, closes: &[(NaiveDate, f64)]) -> Self {
        let points = closes
            .iter()
            .map(|&(date, close)| PricePoint { date, close })
            .collect();
        Self::new(instrument, points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn sorts_by_date() {
        let series = PriceSeries::from_closes("SPY", &[(d(3), 102.0), (d(1), 100.0), (d(2), 101.0)]);
        let dates: Vec<_> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn duplicate_date_keeps_last_observation() {
        let series = PriceSeries::from_closes("SPY", &[(d(1), 100.0), (d(1), 105.0), (d(2), 101.0)]);
        assert_eq!(series.len(), 2);
        assert!((series.points()[0].close - 105.0).abs() < f64::EPSILON);
    }

    #[test]
    fn drops_non_positive_and_nan_closes() {
        let series = PriceSeries::from_closes(
            "SPY",
            &[(d(1), 100.0), (d(2), 0.0), (d(3), -4.0), (d(4), f64::NAN), (d(5), 99.0)],
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(d(1)));
        assert_eq!(series.last_date(), Some(d(5)));
    }

    #[test]
    fn empty_series() {
        let series = PriceSeries::new("BIL", vec![]);
        assert!(series.is_empty());
        assert_eq!(series.first_date(), None);
    }
}
