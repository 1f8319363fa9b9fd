//! CSV report adapter implementing ReportPort.
//!
//! Writes one file per ledger into the output directory:
//! `equity.csv`, `trades.csv`, `taxes.csv`, `regimes.csv`,
//! `monthly_returns.csv`, `yearly_returns.csv` and `summary.csv`.

use std::fs;
use std::path::Path;

use crate::domain::error::RegimeTraderError;
use crate::domain::metrics::{Metrics, PeriodReturn};
use crate::domain::role::Role;
use crate::domain::simulator::SimulationReport;
use crate::domain::tax::TaxEvent;
use crate::ports::report_port::ReportPort;
use tracing::info;

type CsvWriter = csv::Writer<fs::File>;

fn csv_err(e: csv::Error) -> RegimeTraderError {
    RegimeTraderError::Io(e.into())
}

fn writer(dir: &Path, name: &str) -> Result<CsvWriter, RegimeTraderError> {
    csv::Writer::from_path(dir.join(name)).map_err(csv_err)
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

fn write_equity(dir: &Path, report: &SimulationReport) -> Result<(), RegimeTraderError> {
    let mut w = writer(dir, "equity.csv")?;
    w.write_record(["date", "strategy", "benchmark"]).map_err(csv_err)?;
    for (point, bench) in report.equity_curve.iter().zip(&report.benchmark.equity_curve) {
        w.write_record([
            point.date.to_string(),
            format!("{:.2}", point.equity),
            format!("{:.2}", bench.equity),
        ])
        .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

fn write_trades(dir: &Path, report: &SimulationReport) -> Result<(), RegimeTraderError> {
    let mut w = writer(dir, "trades.csv")?;
    let mut header = vec![
        "date".to_string(),
        "regime".to_string(),
        "trigger".to_string(),
    ];
    header.extend(Role::HELD.iter().map(|role| report.roles.instrument(*role).to_string()));
    header.extend(["turnover", "fee", "capital_after"].map(String::from));
    w.write_record(&header).map_err(csv_err)?;

    for trade in &report.trade_log {
        let mut row = vec![
            trade.date.to_string(),
            trade.regime.to_string(),
            trade.trigger.to_string(),
        ];
        row.extend(Role::HELD.iter().map(|role| format!("{:.4}", trade.weights.get(*role))));
        row.push(format!("{:.4}", trade.turnover));
        row.push(format!("{:.2}", trade.fee));
        row.push(format!("{:.2}", trade.capital_after));
        w.write_record(&row).map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

fn tax_row(portfolio: &str, t: &TaxEvent) -> [String; 6] {
    [
        portfolio.to_string(),
        t.date.to_string(),
        t.tax_year.to_string(),
        format!("{:.2}", t.year_gain),
        format!("{:.2}", t.taxable_base),
        format!("{:.2}", t.tax),
    ]
}

fn write_taxes(dir: &Path, report: &SimulationReport) -> Result<(), RegimeTraderError> {
    let mut w = writer(dir, "taxes.csv")?;
    w.write_record(["portfolio", "date", "tax_year", "year_gain", "taxable_base", "tax"])
        .map_err(csv_err)?;

    let strategy = report.tax_log.iter().map(|t| tax_row("strategy", t));
    let benchmark = report.benchmark.tax_log.iter().map(|t| tax_row("benchmark", t));
    for row in strategy.chain(benchmark) {
        w.write_record(&row).map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

fn write_regimes(dir: &Path, report: &SimulationReport) -> Result<(), RegimeTraderError> {
    let mut w = writer(dir, "regimes.csv")?;
    w.write_record(["date", "from", "to"]).map_err(csv_err)?;
    for change in &report.regime_history {
        let from = change.from.map(|r| r.to_string()).unwrap_or_default();
        w.write_record([change.date.to_string(), from, change.to.to_string()])
            .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

fn write_periods(dir: &Path, name: &str, periods: &[PeriodReturn]) -> Result<(), RegimeTraderError> {
    let mut w = writer(dir, name)?;
    w.write_record(["year", "month", "return_pct"]).map_err(csv_err)?;
    for p in periods {
        let month = p.month.map(|m| m.to_string()).unwrap_or_default();
        w.write_record([p.year.to_string(), month, format!("{:.4}", p.value * 100.0)])
            .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

fn metric_rows(m: &Metrics) -> [(&'static str, f64); 9] {
    [
        ("total_return", m.total_return),
        ("cagr", m.cagr),
        ("max_drawdown", m.max_drawdown),
        ("max_drawdown_duration", m.max_drawdown_duration as f64),
        ("sharpe_ratio", m.sharpe_ratio),
        ("sortino_ratio", m.sortino_ratio),
        ("total_fees", m.total_fees),
        ("total_taxes", m.total_taxes),
        ("rebalance_count", m.rebalance_count as f64),
    ]
}

fn write_summary(dir: &Path, report: &SimulationReport) -> Result<(), RegimeTraderError> {
    let mut w = writer(dir, "summary.csv")?;
    w.write_record(["metric", "strategy", "benchmark"]).map_err(csv_err)?;
    w.write_record([
        "final_capital".to_string(),
        format!("{:.2}", report.final_capital),
        format!("{:.2}", report.benchmark.final_capital),
    ])
    .map_err(csv_err)?;
    for ((name, strat), (_, bench)) in metric_rows(&report.metrics)
        .into_iter()
        .zip(metric_rows(&report.benchmark.metrics))
    {
        w.write_record([name.to_string(), format!("{strat:.6}"), format!("{bench:.6}")])
            .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &SimulationReport, output_dir: &Path) -> Result<(), RegimeTraderError> {
        fs::create_dir_all(output_dir)?;

        write_equity(output_dir, report)?;
        write_trades(output_dir, report)?;
        write_taxes(output_dir, report)?;
        write_regimes(output_dir, report)?;
        write_periods(output_dir, "monthly_returns.csv", &report.monthly_returns)?;
        write_periods(output_dir, "yearly_returns.csv", &report.yearly_returns)?;
        write_summary(output_dir, report)?;

        info!(dir = %output_dir.display(), "report written");
        Ok(())
    }
}
