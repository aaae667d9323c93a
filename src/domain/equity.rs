//! Equity simulation: lagged strategy returns compounded into equity curves.
//!
//! strategy_return[t] = state[t-1] * market_return[t]. The state observed on
//! the close of t-1 is only applied to the return earned over t, so no row
//! reads a price from its own future.

use crate::domain::error::TradelensError;
use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::{PositionState, SignalSeries};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// One date of the augmented strategy table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub close: f64,
    pub indicators: Vec<f64>,
    pub state: PositionState,
    pub change: i8,
    /// Close-to-close return from the previous bar; `None` until the series'
    /// return anchor.
    pub market_return: Option<f64>,
    pub strategy_return: Option<f64>,
    pub strategy_equity: f64,
    pub buy_hold_equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub strategy: String,
    pub indicators: Vec<IndicatorType>,
    pub initial_capital: f64,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn strategy_curve(&self) -> Vec<EquityPoint> {
        self.rows
            .iter()
            .map(|r| EquityPoint {
                date: r.date,
                equity: r.strategy_equity,
            })
            .collect()
    }

    pub fn buy_hold_curve(&self) -> Vec<EquityPoint> {
        self.rows
            .iter()
            .map(|r| EquityPoint {
                date: r.date,
                equity: r.buy_hold_equity,
            })
            .collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// Running compounded growth that skips undefined returns.
#[derive(Debug, Clone, Copy)]
struct Compounder {
    growth: f64,
}

impl Compounder {
    fn new() -> Self {
        Self { growth: 1.0 }
    }

    fn apply(&mut self, ret: Option<f64>) -> f64 {
        if let Some(r) = ret {
            self.growth *= 1.0 + r;
        }
        self.growth
    }
}

/// Builds the feature table for `series`, which must have been generated from
/// `bars`.
///
/// A row's market return is measured from the bar immediately before it, so
/// a strategy whose returns start at bar 0 keeps the first close-to-close move
/// even when its first signal row comes later. Warmup bars count as Flat for
/// the lagged strategy return.
pub fn simulate(
    bars: &[OhlcvBar],
    series: &SignalSeries,
    initial_capital: f64,
) -> Result<FeatureTable, TradelensError> {
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(TradelensError::invalid_parameter(
            "initial_capital",
            initial_capital,
            "must be positive",
        ));
    }
    if series.points.is_empty() {
        return Err(TradelensError::invalid_input(
            "signal series has no rows to simulate",
        ));
    }

    let mut rows = Vec::with_capacity(series.points.len());
    let mut strategy_growth = Compounder::new();
    let mut buy_hold_growth = Compounder::new();
    let mut prev_state = PositionState::Flat;

    for point in &series.points {
        let bar = bar_at(bars, point.bar_index)?;
        if bar.date != point.date {
            return Err(TradelensError::invalid_input(format!(
                "signal row {} does not match bar {} on {}",
                point.date, point.bar_index, bar.date
            )));
        }

        let market_return = if point.bar_index > series.returns_from {
            let base = bar_at(bars, point.bar_index - 1)?;
            Some(point.close / base.close - 1.0)
        } else {
            None
        };
        let strategy_return = market_return.map(|r| prev_state.exposure() * r);
        prev_state = point.state;

        rows.push(FeatureRow {
            date: point.date,
            close: point.close,
            indicators: point.indicators.clone(),
            state: point.state,
            change: point.change,
            market_return,
            strategy_return,
            strategy_equity: initial_capital * strategy_growth.apply(strategy_return),
            buy_hold_equity: initial_capital * buy_hold_growth.apply(market_return),
        });
    }

    tracing::debug!(
        strategy = %series.strategy,
        rows = rows.len(),
        "simulated equity curves"
    );

    Ok(FeatureTable {
        strategy: series.strategy.clone(),
        indicators: series.indicators.clone(),
        initial_capital,
        rows,
    })
}

fn bar_at(bars: &[OhlcvBar], index: usize) -> Result<&OhlcvBar, TradelensError> {
    bars.get(index).ok_or_else(|| {
        TradelensError::invalid_input(format!(
            "signal row refers to bar {} but the series has {} bars",
            index,
            bars.len()
        ))
    })
}
