//! Backtest pipeline: price series to signals, equity, trades and drawdown.
//!
//! BacktestConfig defines the run parameters shared by every strategy.

use crate::domain::drawdown::{analyze_drawdown, DrawdownAnalysis};
use crate::domain::equity::{simulate, FeatureTable};
use crate::domain::error::TradelensError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::{validate_series, OhlcvBar};
use crate::domain::signal::{derive_events, PositionEvent, SignalGenerator};
use crate::domain::trade::{open_positions, pair_trades, OpenPosition, Trade};
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub risk_free_rate: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub table: FeatureTable,
    pub events: Vec<PositionEvent>,
    pub trades: Vec<Trade>,
    pub open_positions: Vec<OpenPosition>,
    pub drawdown: DrawdownAnalysis,
    pub metrics: Metrics,
}

/// Runs one strategy over one price series.
///
/// Inputs are validated before anything is computed. The result owns all of
/// its data, so independent runs share nothing.
pub fn run_backtest(
    bars: &[OhlcvBar],
    strategy: &dyn SignalGenerator,
    config: &BacktestConfig,
) -> Result<BacktestResult, TradelensError> {
    if !config.initial_capital.is_finite() || config.initial_capital <= 0.0 {
        return Err(TradelensError::invalid_parameter(
            "initial_capital",
            config.initial_capital,
            "must be positive",
        ));
    }
    validate_series(bars, strategy.min_bars())?;

    let series = strategy.generate(bars)?;
    let table = simulate(bars, &series, config.initial_capital)?;
    let events = derive_events(&series);
    let trades = pair_trades(&events, config.initial_capital)?;
    let open_positions = open_positions(&events);
    let drawdown = analyze_drawdown(&table.strategy_curve())?;
    let metrics = Metrics::compute(
        &table,
        &trades,
        &drawdown.episode,
        config.risk_free_rate,
    );

    tracing::debug!(
        strategy = strategy.name(),
        bars = bars.len(),
        rows = table.rows.len(),
        events = events.len(),
        trades = trades.len(),
        "backtest complete"
    );

    Ok(BacktestResult {
        table,
        events,
        trades,
        open_positions,
        drawdown,
        metrics,
    })
}
