//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_date, strategy_kind, validate_backtest_config, validate_data_config,
    validate_strategy_config, DEFAULT_FAST_PERIOD, DEFAULT_INITIAL_CAPITAL, DEFAULT_OVERBOUGHT,
    DEFAULT_OVERSOLD, DEFAULT_RSI_PERIOD, DEFAULT_SLOW_PERIOD,
};
use crate::domain::error::TradelensError;
use crate::domain::strategy::{StrategyConfig, StrategyKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// Environment variable that overrides `--log-level`.
pub const LOG_ENV: &str = "TRADELENS_LOG";

#[derive(Parser, Debug)]
#[command(name = "tradelens", about = "Single-asset strategy backtester")]
pub struct Cli {
    /// Log filter, e.g. `info` or `tradelens=debug`
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        /// Directory for the CSV report; overrides [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
}

pub fn init_tracing(log_level: &str) -> Result<(), String> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| format!("failed to install tracing subscriber: {err}"))
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            code,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, code.as_deref())
            } else {
                run_backtest(&config, code.as_deref(), output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradelensError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn validate_all(adapter: &dyn ConfigPort) -> Result<(), TradelensError> {
    validate_backtest_config(adapter)?;
    validate_strategy_config(adapter)?;
    validate_data_config(adapter)
}

fn run_backtest(config_path: &Path, code_override: Option<&str>, output: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    tracing::info!(config_path = %config_path.display(), "config loaded");

    match backtest_from_config(&adapter, code_override, output) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Validates the config, loads prices, runs the backtest and writes the
/// report when an output directory is known.
pub fn backtest_from_config(
    adapter: &dyn ConfigPort,
    code_override: Option<&str>,
    output: Option<&Path>,
) -> Result<BacktestResult, TradelensError> {
    validate_all(adapter)?;

    let strategy_config = build_strategy_config(adapter)?;
    let bt_config = build_backtest_config(adapter)?;
    let code = require_code(code_override, adapter)?;
    let data_port = build_data_port(adapter)?;

    let output_dir = output
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("report", "output_dir").map(PathBuf::from));

    run_backtest_pipeline(
        data_port.as_ref(),
        &strategy_config,
        &bt_config,
        &code,
        output_dir.as_deref(),
    )
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy_config: &StrategyConfig,
    bt_config: &BacktestConfig,
    code: &str,
    output_dir: Option<&Path>,
) -> Result<BacktestResult, TradelensError> {
    let strategy = strategy_config.build()?;
    eprintln!("Strategy: {}", strategy_config);

    let bars = data_port.fetch_ohlcv(code, bt_config.start_date, bt_config.end_date)?;
    if bars.is_empty() {
        return Err(TradelensError::NoData {
            code: code.to_string(),
        });
    }
    tracing::info!(code, bars = bars.len(), "loaded prices");

    eprintln!(
        "Running backtest: {} {} bars, {} to {}",
        code,
        bars.len(),
        bt_config.start_date,
        bt_config.end_date,
    );

    let result = backtest_engine::run_backtest(&bars, strategy.as_ref(), bt_config)?;
    print_summary(&result, code);

    if let Some(dir) = output_dir {
        CsvReportAdapter::new().write(&result, strategy.name(), dir)?;
        eprintln!("\nReport written to: {}", dir.display());
    }

    Ok(result)
}

fn print_summary(result: &BacktestResult, code: &str) {
    let m = &result.metrics;
    let ep = &result.drawdown.episode;

    eprintln!("\n=== Results: {} ===", code);
    if let (Some(first), Some(last)) = (result.table.first_date(), result.table.last_date()) {
        eprintln!("Period:           {} to {}", first, last);
    }
    eprintln!("Final Equity:     {:.2}", m.final_equity);
    eprintln!("Total Return:     {:.2}%", m.total_return_pct);
    eprintln!("Buy & Hold:       {:.2}%", m.buy_hold_return_pct);
    eprintln!("Annualized:       {:.2}%", m.annualized_return_pct);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", m.sortino_ratio);
    eprintln!("Max Drawdown:     {:.1}%", m.max_drawdown_pct);
    eprintln!("  Peak:           {}", ep.peak_date);
    eprintln!("  Trough:         {}", ep.trough_date);
    match ep.recovery_date {
        Some(date) => eprintln!("  Recovery:       {}", date),
        None => eprintln!("  Recovery:       not recovered"),
    }
    eprintln!("Total Trades:     {}", m.total_trades);
    eprintln!("Win Rate:         {:.1}%", m.win_rate_pct);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);

    for open in &result.open_positions {
        eprintln!(
            "Open position:    entered {} at {:.2}",
            open.entry_date, open.entry_price
        );
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TradelensError> {
    let start_str = adapter.get_string("backtest", "start_date");
    let end_str = adapter.get_string("backtest", "end_date");

    Ok(BacktestConfig {
        start_date: parse_date(start_str.as_deref(), "start_date")?,
        end_date: parse_date(end_str.as_deref(), "end_date")?,
        initial_capital: adapter.get_double(
            "backtest",
            "initial_capital",
            DEFAULT_INITIAL_CAPITAL,
        ),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.0),
    })
}

fn get_period(adapter: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, TradelensError> {
    let value = adapter.get_int("strategy", key, default);
    usize::try_from(value).map_err(|_| TradelensError::ConfigInvalid {
        section: "strategy".into(),
        key: key.into(),
        reason: format!("{} must be a positive integer", key),
    })
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, TradelensError> {
    match strategy_kind(adapter)? {
        StrategyKind::MaCrossover => Ok(StrategyConfig::MaCrossover {
            fast_period: get_period(adapter, "fast_period", DEFAULT_FAST_PERIOD)?,
            slow_period: get_period(adapter, "slow_period", DEFAULT_SLOW_PERIOD)?,
        }),
        StrategyKind::RsiMeanReversion => Ok(StrategyConfig::RsiMeanReversion {
            period: get_period(adapter, "rsi_period", DEFAULT_RSI_PERIOD)?,
            oversold: adapter.get_double("strategy", "oversold", DEFAULT_OVERSOLD),
            overbought: adapter.get_double("strategy", "overbought", DEFAULT_OVERBOUGHT),
        }),
    }
}

pub fn build_data_port(adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, TradelensError> {
    let source = adapter
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.trim().to_lowercase().as_str() {
        "csv" => {
            let dir = adapter.get_string("data", "csv_dir").ok_or_else(|| {
                TradelensError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                }
            })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            Ok(Box::new(SqliteAdapter::from_config(adapter)?))
        }
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => Err(TradelensError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "sqlite feature is required for source = sqlite".into(),
        }),
        other => Err(TradelensError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown data source {}", other),
        }),
    }
}

pub fn resolve_code(code_override: Option<&str>, config: &dyn ConfigPort) -> Option<String> {
    code_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "code"))
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
}

fn require_code(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, TradelensError> {
    resolve_code(code_override, config).ok_or_else(|| TradelensError::ConfigMissing {
        section: "backtest".into(),
        key: "code".into(),
    })
}

pub fn run_dry_run(config_path: &Path, code_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Config validated successfully");

    let strategy_config = match build_strategy_config(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let strategy = match strategy_config.build() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nStrategy: {}", strategy_config);
    eprintln!("  warmup bars:  {}", strategy.warmup_bars());
    eprintln!("  minimum bars: {}", strategy.min_bars());

    match require_code(code_override, &adapter) {
        Ok(code) => eprintln!("\nCode: {}", code),
        Err(e) => {
            eprintln!("error: {e} (use --code or set [backtest] code)");
            return (&e).into();
        }
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    match build_strategy_config(&adapter).and_then(|s| s.build().map(|_| s)) {
        Ok(s) => eprintln!("\nStrategy: {}", s),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, code_override: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let code = match require_code(code_override, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e} (use --code or set [backtest] code)");
            return (&e).into();
        }
    };

    let data_port = match build_data_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match data_port.get_data_range(&code) {
        Ok(Some((min_date, max_date, count))) => {
            println!("{}: {} bars, {} to {}", code, count, min_date, max_date);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            let err = TradelensError::NoData { code };
            eprintln!("error: {err}");
            (&err).into()
        }
        Err(e) => {
            eprintln!("error querying {}: {}", code, e);
            (&e).into()
        }
    }
}
