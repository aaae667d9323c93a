//! Strategy signal generation and position-change events.
//!
//! A [`SignalGenerator`] turns a price series into a [`SignalSeries`]: one row
//! per date on which the strategy's indicators are warmed up, each carrying a
//! Flat/Long state and the first difference of that state. Warmup dates are
//! left out of the series entirely and count as Flat, so the first retained
//! row is differenced against Flat.
//!
//! State at date t only reads bars `0..=t`. Acting on it is delayed by one
//! bar in [`crate::domain::equity`].

use crate::domain::error::TradelensError;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
}

impl PositionState {
    pub fn as_i8(self) -> i8 {
        match self {
            PositionState::Flat => 0,
            PositionState::Long => 1,
        }
    }

    /// Fraction of capital exposed to the next bar's return.
    pub fn exposure(self) -> f64 {
        f64::from(self.as_i8())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalPoint {
    /// Index of the bar in the input price series.
    pub bar_index: usize,
    pub date: NaiveDate,
    pub close: f64,
    /// Indicator values in the order of [`SignalSeries::indicators`].
    pub indicators: Vec<f64>,
    /// Indicator value that drives the state machine, if the strategy has one.
    pub trigger: Option<f64>,
    pub state: PositionState,
    /// First difference of `state`: +1 entry, -1 exit, 0 no change.
    pub change: i8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub strategy: String,
    pub indicators: Vec<IndicatorType>,
    /// Bar index whose close anchors the first market return. Rows at or
    /// before it carry no return.
    pub returns_from: usize,
    pub points: Vec<SignalPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Entry,
    Exit,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Entry => write!(f, "ENTRY"),
            EventKind::Exit => write!(f, "EXIT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionEvent {
    pub date: NaiveDate,
    pub kind: EventKind,
    pub price: f64,
    pub indicator: Option<f64>,
}

/// Common contract for strategy rules.
pub trait SignalGenerator {
    fn name(&self) -> &str;

    /// Longest indicator lookback, in bars.
    fn warmup_bars(&self) -> usize;

    /// Smallest price series this generator accepts.
    fn min_bars(&self) -> usize {
        self.warmup_bars() + 2
    }

    fn generate(&self, bars: &[OhlcvBar]) -> Result<SignalSeries, TradelensError>;
}

/// Fast/slow simple moving average crossover: Long while fast > slow.
#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossover {
    fast_period: usize,
    slow_period: usize,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Result<Self, TradelensError> {
        if fast_period == 0 {
            return Err(TradelensError::invalid_parameter(
                "fast_period",
                fast_period,
                "must be positive",
            ));
        }
        if slow_period <= fast_period {
            return Err(TradelensError::invalid_parameter(
                "slow_period",
                slow_period,
                format!("must be greater than fast_period {}", fast_period),
            ));
        }
        Ok(Self {
            fast_period,
            slow_period,
        })
    }
}

impl SignalGenerator for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        self.slow_period
    }

    fn generate(&self, bars: &[OhlcvBar]) -> Result<SignalSeries, TradelensError> {
        let fast = calculate_sma(bars, self.fast_period)?;
        let slow = calculate_sma(bars, self.slow_period)?;

        let mut points = Vec::with_capacity(bars.len() + 1 - self.slow_period);
        let mut prev = PositionState::Flat;

        for (i, bar) in bars.iter().enumerate() {
            let (Some(f), Some(s)) = (fast.value_at(i), slow.value_at(i)) else {
                continue;
            };
            let state = if f > s {
                PositionState::Long
            } else {
                PositionState::Flat
            };
            points.push(SignalPoint {
                bar_index: i,
                date: bar.date,
                close: bar.close,
                indicators: vec![f, s],
                trigger: None,
                state,
                change: state.as_i8() - prev.as_i8(),
            });
            prev = state;
        }

        tracing::debug!(
            strategy = self.name(),
            fast = self.fast_period,
            slow = self.slow_period,
            rows = points.len(),
            "generated crossover signal"
        );

        // Returns are only taken between crossover rows.
        let returns_from = points.first().map_or(bars.len(), |p| p.bar_index);

        Ok(SignalSeries {
            strategy: self.name().to_string(),
            indicators: vec![fast.indicator_type, slow.indicator_type],
            returns_from,
            points,
        })
    }
}

/// RSI mean reversion: go Long below `oversold`, back to Flat above
/// `overbought`, hold in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiMeanReversion {
    period: usize,
    oversold: f64,
    overbought: f64,
}

impl RsiMeanReversion {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Result<Self, TradelensError> {
        if period == 0 {
            return Err(TradelensError::invalid_parameter(
                "rsi_period",
                period,
                "must be positive",
            ));
        }
        for (name, value) in [("oversold", oversold), ("overbought", overbought)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(TradelensError::invalid_parameter(
                    name,
                    value,
                    "must be between 0 and 100",
                ));
            }
        }
        if oversold >= overbought {
            return Err(TradelensError::invalid_parameter(
                "overbought",
                overbought,
                format!("must be greater than oversold {}", oversold),
            ));
        }
        Ok(Self {
            period,
            oversold,
            overbought,
        })
    }

    fn next_state(&self, current: PositionState, rsi: f64) -> PositionState {
        if rsi < self.oversold {
            PositionState::Long
        } else if rsi > self.overbought {
            PositionState::Flat
        } else {
            current
        }
    }
}

impl SignalGenerator for RsiMeanReversion {
    fn name(&self) -> &str {
        "rsi_mean_reversion"
    }

    fn warmup_bars(&self) -> usize {
        self.period
    }

    fn generate(&self, bars: &[OhlcvBar]) -> Result<SignalSeries, TradelensError> {
        let rsi = calculate_rsi(bars, self.period)?;
        let first = rsi.first_valid().unwrap_or(bars.len());

        let mut points = Vec::with_capacity(bars.len() - first);
        let mut state = PositionState::Flat;

        for (i, bar) in bars.iter().enumerate().skip(first) {
            let Some(value) = rsi.value_at(i) else {
                continue;
            };
            let prev = state;
            state = self.next_state(state, value);
            points.push(SignalPoint {
                bar_index: i,
                date: bar.date,
                close: bar.close,
                indicators: vec![value],
                trigger: Some(value),
                state,
                change: state.as_i8() - prev.as_i8(),
            });
        }

        tracing::debug!(
            strategy = self.name(),
            period = self.period,
            rows = points.len(),
            "generated RSI signal"
        );

        Ok(SignalSeries {
            strategy: self.name().to_string(),
            indicators: vec![rsi.indicator_type],
            returns_from: 0,
            points,
        })
    }
}

/// Position events from the non-zero changes of a signal series, in date order.
pub fn derive_events(series: &SignalSeries) -> Vec<PositionEvent> {
    series
        .points
        .iter()
        .filter_map(|p| {
            let kind = match p.change {
                1 => EventKind::Entry,
                -1 => EventKind::Exit,
                _ => return None,
            };
            Some(PositionEvent {
                date: p.date,
                kind,
                price: p.close,
                indicator: p.trigger,
            })
        })
        .collect()
}
