//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::TradelensError;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_FAST_PERIOD: i64 = 50;
pub const DEFAULT_SLOW_PERIOD: i64 = 200;
pub const DEFAULT_RSI_PERIOD: i64 = 14;
pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    validate_code(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    match strategy_kind(config)? {
        StrategyKind::MaCrossover => validate_ma_periods(config),
        StrategyKind::RsiMeanReversion => {
            validate_rsi_period(config)?;
            validate_thresholds(config)
        }
    }
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => match config.get_string("data", "csv_dir") {
            Some(dir) if !dir.trim().is_empty() => Ok(()),
            _ => Err(missing("data", "csv_dir")),
        },
        "sqlite" => {
            match config.get_string("sqlite", "path") {
                Some(path) if !path.trim().is_empty() => {}
                _ => return Err(missing("sqlite", "path")),
            }
            if config.get_int("sqlite", "pool_size", 4) < 1 {
                return Err(invalid("sqlite", "pool_size", "pool_size must be at least 1"));
            }
            Ok(())
        }
        _ => Err(invalid("data", "source", "source must be csv or sqlite")),
    }
}

/// Reads `[strategy] kind`, defaulting to the moving average crossover.
pub fn strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, TradelensError> {
    match config.get_string("strategy", "kind") {
        None => Ok(StrategyKind::MaCrossover),
        Some(s) => s.parse().map_err(|_| {
            invalid(
                "strategy",
                "kind",
                "kind must be ma_crossover or rsi_mean_reversion",
            )
        }),
    }
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, TradelensError> {
    match value {
        None => Err(missing("backtest", field)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                &format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn validate_code(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    match config.get_string("backtest", "code") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(missing("backtest", "code")),
    }
}

fn validate_ma_periods(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let fast = config.get_int("strategy", "fast_period", DEFAULT_FAST_PERIOD);
    let slow = config.get_int("strategy", "slow_period", DEFAULT_SLOW_PERIOD);
    if fast < 1 {
        return Err(invalid(
            "strategy",
            "fast_period",
            "fast_period must be at least 1",
        ));
    }
    if slow <= fast {
        return Err(invalid(
            "strategy",
            "slow_period",
            "slow_period must be greater than fast_period",
        ));
    }
    Ok(())
}

fn validate_rsi_period(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    if config.get_int("strategy", "rsi_period", DEFAULT_RSI_PERIOD) < 1 {
        return Err(invalid(
            "strategy",
            "rsi_period",
            "rsi_period must be at least 1",
        ));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let oversold = config.get_double("strategy", "oversold", DEFAULT_OVERSOLD);
    let overbought = config.get_double("strategy", "overbought", DEFAULT_OVERBOUGHT);
    for (key, value) in [("oversold", oversold), ("overbought", overbought)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid(
                "strategy",
                key,
                &format!("{} must be between 0 and 100", key),
            ));
        }
    }
    if oversold >= overbought {
        return Err(invalid(
            "strategy",
            "oversold",
            "oversold must be below overbought",
        ));
    }
    Ok(())
}

fn missing(section: &str, key: &str) -> TradelensError {
    TradelensError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TradelensError {
    TradelensError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
