//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::SimulationConfig;
use crate::domain::config_validation::validate_simulation_config;
use crate::domain::error::RegimeTraderError;
use crate::domain::momentum::Horizon;
use crate::domain::price_store::PriceSeriesStore;
use crate::domain::rebalance::RebalanceCadence;
use crate::domain::recommendation::Recommendation;
use crate::domain::role::{Role, RoleAssignment};
use crate::domain::simulator::{SimulationReport, run_simulation};
use crate::domain::sweep::{SweepGrid, SweepOutcome, run_sweep};
use crate::domain::tax::TaxConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_PRICE_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "regimetrader", about = "Regime-switching asset allocation backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price directory, overrides [data] price_dir
        #[arg(long)]
        prices: Option<PathBuf>,
        /// Directory for CSV reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the target allocation from the latest close
    Recommend {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        prices: Option<PathBuf>,
    },
    /// Run a backtest per parameter combination
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        prices: Option<PathBuf>,
        #[arg(long, value_delimiter = ',')]
        fee_rates: Vec<f64>,
        #[arg(long, value_delimiter = ',')]
        ma_windows: Vec<usize>,
        #[arg(long, value_delimiter = ',')]
        bull_fractions: Vec<f64>,
        #[arg(long, value_delimiter = ',')]
        hedges: Vec<f64>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            prices,
            output,
        } => run_backtest(&config, prices.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Recommend { config, prices } => run_recommend(&config, prices.as_deref()),
        Command::Sweep {
            config,
            prices,
            fee_rates,
            ma_windows,
            bull_fractions,
            hedges,
        } => {
            let grid = SweepGrid {
                fee_rates,
                ma_windows,
                bull_fractions,
                hedges,
            };
            run_sweep_command(&config, prices.as_deref(), &grid)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RegimeTraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| RegimeTraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn parse_date(adapter: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, RegimeTraderError> {
    adapter
        .get_string("simulation", key)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                RegimeTraderError::invalid(
                    "simulation",
                    key,
                    "invalid date format (expected YYYY-MM-DD)",
                )
            })
        })
        .transpose()
}

fn parse_horizons(adapter: &dyn ConfigPort) -> Result<Option<Vec<Horizon>>, RegimeTraderError> {
    let lookbacks = adapter.get_list("strategy", "momentum_lookbacks");
    let weights = adapter.get_list("strategy", "momentum_weights");

    let (lookbacks, weights) = match (lookbacks, weights) {
        (None, None) => return Ok(None),
        (Some(l), Some(w)) => (l, w),
        (Some(_), None) => {
            return Err(RegimeTraderError::ConfigMissing {
                section: "strategy".into(),
                key: "momentum_weights".into(),
            });
        }
        (None, Some(_)) => {
            return Err(RegimeTraderError::ConfigMissing {
                section: "strategy".into(),
                key: "momentum_lookbacks".into(),
            });
        }
    };

    if lookbacks.len() != weights.len() {
        return Err(RegimeTraderError::invalid(
            "strategy",
            "momentum_weights",
            format!(
                "{} weights for {} lookbacks",
                weights.len(),
                lookbacks.len()
            ),
        ));
    }

    lookbacks
        .iter()
        .zip(&weights)
        .map(|(l, w)| {
            let lookback = l.parse::<usize>().map_err(|_| {
                RegimeTraderError::invalid("strategy", "momentum_lookbacks", format!("'{l}' is not a day count"))
            })?;
            let weight = w.parse::<f64>().map_err(|_| {
                RegimeTraderError::invalid("strategy", "momentum_weights", format!("'{w}' is not a number"))
            })?;
            Ok(Horizon::new(lookback, weight))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn parse_roles(adapter: &dyn ConfigPort) -> RoleAssignment {
    let defaults = RoleAssignment::default();
    let get = |role: Role| {
        adapter
            .get_string("instruments", role.config_key())
            .unwrap_or_else(|| defaults.instrument(role).to_string())
    };
    RoleAssignment {
        base: get(Role::Base),
        leveraged: get(Role::Leveraged),
        defense_cash: get(Role::DefenseCash),
        defense_bond: get(Role::DefenseBond),
        canary: get(Role::Canary),
    }
}

/// Reads every section of the INI layout; absent keys take their defaults.
pub fn build_simulation_config(adapter: &dyn ConfigPort) -> Result<SimulationConfig, RegimeTraderError> {
    let defaults = SimulationConfig::default();

    let cadence = match adapter.get_string("simulation", "rebalance") {
        Some(s) => s
            .parse::<RebalanceCadence>()
            .map_err(|reason| RegimeTraderError::invalid("simulation", "rebalance", reason))?,
        None => defaults.cadence,
    };

    let decision_lag = match adapter.get_uint("simulation", "decision_lag")? {
        Some(lag) => NonZeroUsize::new(lag as usize).ok_or_else(|| {
            RegimeTraderError::invalid("simulation", "decision_lag", "decision_lag must be at least 1")
        })?,
        None => defaults.decision_lag,
    };

    let tax = TaxConfig {
        enabled: adapter.get_bool("tax", "enabled")?.unwrap_or(defaults.tax.enabled),
        deduction: adapter.get_double("tax", "deduction")?.unwrap_or(defaults.tax.deduction),
        rate: adapter.get_double("tax", "rate")?.unwrap_or(defaults.tax.rate),
    };

    Ok(SimulationConfig {
        initial_capital: adapter
            .get_double("simulation", "initial_capital")?
            .unwrap_or(defaults.initial_capital),
        fee_rate: adapter
            .get_double("simulation", "fee_rate")?
            .unwrap_or(defaults.fee_rate),
        tax,
        ma_window: adapter
            .get_uint("strategy", "ma_window")?
            .map(|w| w as usize)
            .unwrap_or(defaults.ma_window),
        horizons: parse_horizons(adapter)?.unwrap_or(defaults.horizons),
        roles: parse_roles(adapter),
        benchmark: adapter.get_string("instruments", "benchmark"),
        bull_base_fraction: adapter
            .get_double("strategy", "bull_base_fraction")?
            .unwrap_or(defaults.bull_base_fraction),
        partial_hedge: adapter
            .get_double("strategy", "partial_hedge")?
            .unwrap_or(defaults.partial_hedge),
        use_trend_filter: adapter
            .get_bool("strategy", "use_trend_filter")?
            .unwrap_or(defaults.use_trend_filter),
        cadence,
        decision_lag,
        start_date: parse_date(adapter, "start_date")?,
        end_date: parse_date(adapter, "end_date")?,
        risk_free_rate: adapter
            .get_double("simulation", "risk_free_rate")?
            .unwrap_or(defaults.risk_free_rate),
    })
}

/// `--prices` wins over `[data] price_dir`.
pub fn resolve_price_dir(override_dir: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => config
            .get_string("data", "price_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PRICE_DIR)),
    }
}

/// Loads every instrument the configuration needs into one aligned store.
pub fn load_price_store(
    data_port: &dyn PriceDataPort,
    config: &SimulationConfig,
) -> Result<PriceSeriesStore, RegimeTraderError> {
    let instruments = config.required_instruments();
    let mut series = Vec::with_capacity(instruments.len());
    for instrument in &instruments {
        series.push(data_port.fetch_closes(instrument)?);
    }
    let store = PriceSeriesStore::new(series)?;
    info!(
        instruments = instruments.len(),
        dates = store.len(),
        "price store loaded"
    );
    Ok(store)
}

fn prepare(
    config_path: &Path,
    prices: Option<&Path>,
) -> Result<(SimulationConfig, PriceSeriesStore), RegimeTraderError> {
    let adapter = load_config(config_path)?;
    let config = build_simulation_config(&adapter)?;
    validate_simulation_config(&config)?;

    let data_port = CsvPriceAdapter::new(resolve_price_dir(prices, &adapter));
    let store = load_price_store(&data_port, &config)?;
    Ok((config, store))
}

fn run_backtest(
    config_path: &Path,
    prices: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), RegimeTraderError> {
    let (config, store) = prepare(config_path, prices)?;
    let report = run_simulation(&store, &config)?;

    print_summary(&report);

    if let Some(dir) = output {
        CsvReportAdapter::new().write(&report, dir)?;
        eprintln!("\nReport written to: {}", dir.display());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), RegimeTraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let config = build_simulation_config(&adapter)?;
    validate_simulation_config(&config)?;
    eprintln!("Config validated successfully");
    Ok(())
}

fn run_recommend(config_path: &Path, prices: Option<&Path>) -> Result<(), RegimeTraderError> {
    let (config, store) = prepare(config_path, prices)?;
    let report = run_simulation(&store, &config)?;
    print!("{}", format_recommendation(&report.recommendation));
    Ok(())
}

fn run_sweep_command(
    config_path: &Path,
    prices: Option<&Path>,
    grid: &SweepGrid,
) -> Result<(), RegimeTraderError> {
    let (config, store) = prepare(config_path, prices)?;
    let variants = grid.variants(&config);
    eprintln!("Running sweep: {} variants", variants.len());
    let outcomes = run_sweep(&store, &variants)?;
    print!("{}", format_sweep(&outcomes));
    Ok(())
}

fn print_summary(report: &SimulationReport) {
    let m = &report.metrics;
    let b = &report.benchmark.metrics;

    if let (Some(start), Some(end)) = (report.start_date(), report.end_date()) {
        eprintln!("Backtest: {} to {} ({} days)", start, end, report.equity_curve.len());
    }
    eprintln!("\n=== Results ===          Strategy     Benchmark ({})", report.benchmark.instrument);
    eprintln!(
        "Final Capital:     {:>14.0} {:>14.0}",
        report.final_capital, report.benchmark.final_capital
    );
    eprintln!(
        "Total Return:      {:>13.2}% {:>13.2}%",
        m.total_return * 100.0,
        b.total_return * 100.0
    );
    eprintln!("CAGR:              {:>13.2}% {:>13.2}%", m.cagr * 100.0, b.cagr * 100.0);
    eprintln!(
        "Max Drawdown:      {:>13.2}% {:>13.2}%",
        m.max_drawdown * 100.0,
        b.max_drawdown * 100.0
    );
    eprintln!("Sharpe Ratio:      {:>14.2} {:>14.2}", m.sharpe_ratio, b.sharpe_ratio);
    eprintln!("Sortino Ratio:     {:>14.2} {:>14.2}", m.sortino_ratio, b.sortino_ratio);
    eprintln!("Taxes Paid:        {:>14.0} {:>14.0}", m.total_taxes, b.total_taxes);
    eprintln!("Fees Paid:         {:>14.0}", m.total_fees);
    eprintln!("Rebalances:        {:>14}", m.rebalance_count);

    if !report.yearly_returns.is_empty() {
        eprintln!("\n=== Yearly Returns ===");
        for y in &report.yearly_returns {
            eprintln!("  {}: {:>7.2}%", y.year, y.value * 100.0);
        }
    }
}

pub fn format_recommendation(rec: &Recommendation) -> String {
    let mut out = format!("Action plan from close of {}\n", rec.date);
    out.push_str(&format!("Regime: {}\n", rec.regime));
    for h in &rec.holdings {
        out.push_str(&format!(
            "  {:<8} {:>6.1}%  ({})\n",
            h.instrument,
            h.weight * 100.0,
            h.role
        ));
    }
    if rec.change_required {
        out.push_str("Rebalance required\n");
    } else {
        out.push_str("No change from current holdings\n");
    }
    out
}

pub fn format_sweep(outcomes: &[SweepOutcome]) -> String {
    let mut out = format!(
        "{:<48} {:>9} {:>8} {:>9} {:>7} {:>16}\n",
        "variant", "return%", "cagr%", "mdd%", "sharpe", "final_capital"
    );
    for o in outcomes {
        out.push_str(&format!(
            "{:<48} {:>9.2} {:>8.2} {:>9.2} {:>7.2} {:>16.0}\n",
            o.label,
            o.metrics.total_return * 100.0,
            o.metrics.cagr * 100.0,
            o.metrics.max_drawdown * 100.0,
            o.metrics.sharpe_ratio,
            o.final_capital
        ));
    }
    out
}
