//! CLI integration tests for config-driven orchestration.
//!
//! Tests cover:
//! - Config parsing into backtest and strategy settings
//! - Dry-run, validate and info commands against real INI files on disk
//! - Full config-driven backtest over a CSV price directory

mod common;

use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tradelens::adapters::file_config_adapter::FileConfigAdapter;
use tradelens::cli::{self, Cli, Command};
use tradelens::domain::error::TradelensError;
use tradelens::domain::strategy::StrategyConfig;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_prices_csv(dir: &Path, code: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    fs::write(dir.join(format!("{}.csv", code)), content).unwrap();
}

fn ini_for(csv_dir: &Path, strategy: &str) -> String {
    format!(
        "[backtest]\n\
         initial_capital = 10000\n\
         risk_free_rate = 0.0\n\
         start_date = 2024-01-01\n\
         end_date = 2024-12-31\n\
         code = spy\n\
         \n\
         {strategy}\n\
         \n\
         [data]\n\
         source = csv\n\
         csv_dir = {}\n",
        csv_dir.display()
    )
}

const CROSSOVER: &str = "[strategy]\nkind = ma_crossover\nfast_period = 2\nslow_period = 4";

fn exit_eq(actual: ExitCode, expected: u8) {
    assert_eq!(
        format!("{:?}", actual),
        format!("{:?}", ExitCode::from(expected))
    );
}

mod config_loading {
    use super::*;

    #[test]
    fn build_configs_from_full_ini() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path(), CROSSOVER)).unwrap();

        let bt = cli::build_backtest_config(&adapter).unwrap();
        assert_eq!(bt.start_date, date(2024, 1, 1));
        assert_eq!(bt.end_date, date(2024, 12, 31));
        assert!((bt.initial_capital - 10_000.0).abs() < f64::EPSILON);

        let strategy = cli::build_strategy_config(&adapter).unwrap();
        assert_eq!(
            strategy,
            StrategyConfig::MaCrossover {
                fast_period: 2,
                slow_period: 4
            }
        );
        assert_eq!(cli::resolve_code(None, &adapter), Some("SPY".to_string()));
    }

    #[test]
    fn missing_start_date_is_config_missing() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nend_date = 2024-01-01\n").unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, TradelensError::ConfigMissing { key, .. } if key == "start_date"));
    }
}

mod config_driven_backtest {
    use super::*;

    #[test]
    fn csv_directory_walkthrough() {
        let dir = tempfile::tempdir().unwrap();
        write_prices_csv(
            dir.path(),
            "SPY",
            &bars_from_closes("SPY", "2024-01-01", &WORKED_CLOSES),
        );
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path(), CROSSOVER)).unwrap();

        let out = dir.path().join("report");
        let result = cli::backtest_from_config(&adapter, None, Some(&out)).unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].entry_date(), date(2024, 1, 4));
        assert_eq!(result.trades[0].exit_date(), date(2024, 1, 7));
        assert!(out.join("trades.csv").exists());
    }

    #[test]
    fn code_override_selects_other_file() {
        let dir = tempfile::tempdir().unwrap();
        write_prices_csv(
            dir.path(),
            "QQQ",
            &bars_from_closes(
                "QQQ",
                "2024-02-01",
                &[100.0, 98.0, 96.0, 97.0, 110.0, 120.0, 119.0],
            ),
        );
        let strategy = "[strategy]\nkind = rsi_mean_reversion\nrsi_period = 3";
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path(), strategy)).unwrap();

        let result = cli::backtest_from_config(&adapter, Some("qqq"), None).unwrap();
        assert_eq!(result.trades.len(), 1);
        assert!(result.trades[0].pnl_pct() > 0.0);
    }

    #[test]
    fn missing_price_file_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path(), CROSSOVER)).unwrap();
        let err = cli::backtest_from_config(&adapter, None, None).unwrap_err();
        assert!(matches!(err, TradelensError::NoData { .. }));
    }

    #[test]
    fn invalid_strategy_rejected_before_loading_data() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = "[strategy]\nkind = ma_crossover\nfast_period = 10\nslow_period = 5";
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path(), strategy)).unwrap();
        let err = cli::backtest_from_config(&adapter, None, None).unwrap_err();
        assert!(matches!(err, TradelensError::ConfigInvalid { key, .. } if key == "slow_period"));
    }
}

mod commands {
    use super::*;

    fn run(args: &[&str]) -> ExitCode {
        let mut argv = vec!["tradelens"];
        argv.extend_from_slice(args);
        cli::run(<Cli as clap::Parser>::try_parse_from(argv).unwrap())
    }

    #[test]
    fn dry_run_valid_config_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let ini = write_temp_ini(&ini_for(dir.path(), CROSSOVER));
        let path = ini.path().to_str().unwrap();
        exit_eq(run(&["backtest", "--config", path, "--dry-run"]), 0);
    }

    #[test]
    fn dry_run_invalid_config_exits_with_config_code() {
        let ini = write_temp_ini("[backtest]\ninitial_capital = -5\n");
        let path = ini.path().to_str().unwrap();
        exit_eq(run(&["backtest", "--config", path, "--dry-run"]), 2);
    }

    #[test]
    fn missing_config_file_exits_with_config_code() {
        exit_eq(
            run(&["validate", "--config", "/nonexistent/tradelens.ini"]),
            2,
        );
    }

    #[test]
    fn validate_rsi_config() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = "[strategy]\nkind = rsi_mean_reversion\noversold = 20\noverbought = 80";
        let ini = write_temp_ini(&ini_for(dir.path(), strategy));
        exit_eq(run(&["validate", "-c", ini.path().to_str().unwrap()]), 0);
    }

    #[test]
    fn backtest_command_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_prices_csv(dir.path(), "SPY", &wave_bars("SPY", "2024-01-01", 200));
        let ini = write_temp_ini(&ini_for(dir.path(), CROSSOVER));
        let out = dir.path().join("out");

        exit_eq(
            run(&[
                "backtest",
                "-c",
                ini.path().to_str().unwrap(),
                "-o",
                out.to_str().unwrap(),
            ]),
            0,
        );
        assert!(out.join("features.csv").exists());
    }

    #[test]
    fn info_reports_range_and_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        write_prices_csv(dir.path(), "SPY", &generate_bars("SPY", "2024-01-01", 10, 50.0));
        let ini = write_temp_ini(&ini_for(dir.path(), CROSSOVER));
        let path = ini.path().to_str().unwrap();

        exit_eq(run(&["info", "-c", path]), 0);
        exit_eq(run(&["info", "-c", path, "--code", "IWM"]), 5);
    }

    #[test]
    fn info_without_code_exits_with_config_code() {
        let dir = tempfile::tempdir().unwrap();
        let ini = write_temp_ini(&format!(
            "[data]\nsource = csv\ncsv_dir = {}\n",
            dir.path().display()
        ));
        exit_eq(run(&["info", "-c", ini.path().to_str().unwrap()]), 2);
    }

    #[test]
    fn command_parses_dry_run_flag() {
        let cli = <Cli as clap::Parser>::try_parse_from([
            "tradelens",
            "backtest",
            "-c",
            "a.ini",
            "--dry-run",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Backtest { dry_run: true, .. }));
    }
}
