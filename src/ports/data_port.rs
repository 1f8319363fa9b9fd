//! Price data access port trait.

use crate::domain::error::RegimeTraderError;
use crate::domain::price_series::PriceSeries;

pub trait PriceDataPort {
    /// Full daily close history for one instrument.
    fn fetch_closes(&self, instrument: &str) -> Result<PriceSeries, RegimeTraderError>;
}
