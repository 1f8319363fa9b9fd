//! Report generation port trait.

use crate::domain::error::RegimeTraderError;
use crate::domain::simulator::SimulationReport;
use std::path::Path;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, report: &SimulationReport, output_dir: &Path) -> Result<(), RegimeTraderError>;
}
