//! Trade pairing: ENTRY events matched to the first later EXIT event.

use crate::domain::error::TradelensError;
use crate::domain::signal::{EventKind, PositionEvent};
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    /// Break-even trades count as losses.
    pub fn from_pnl_pct(pnl_pct: f64) -> Self {
        if pnl_pct > 0.0 {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "WIN"),
            Outcome::Loss => write!(f, "LOSS"),
        }
    }
}

/// A closed round trip. Fields are read-only outside this module.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    trade_num: usize,
    entry_date: NaiveDate,
    entry_price: f64,
    exit_date: NaiveDate,
    exit_price: f64,
    pnl_pct: f64,
    pnl_dollar: f64,
    holding_days: i64,
    outcome: Outcome,
    entry_indicator: Option<f64>,
    exit_indicator: Option<f64>,
}

impl Trade {
    fn from_events(
        trade_num: usize,
        entry: &PositionEvent,
        exit: &PositionEvent,
        initial_capital: f64,
    ) -> Self {
        let pnl_pct = (exit.price - entry.price) / entry.price * 100.0;
        Trade {
            trade_num,
            entry_date: entry.date,
            entry_price: entry.price,
            exit_date: exit.date,
            exit_price: exit.price,
            pnl_pct,
            pnl_dollar: pnl_pct / 100.0 * initial_capital,
            holding_days: (exit.date - entry.date).num_days(),
            outcome: Outcome::from_pnl_pct(pnl_pct),
            entry_indicator: entry.indicator,
            exit_indicator: exit.indicator,
        }
    }

    /// 1-based position of the entry among all ENTRY events.
    pub fn trade_num(&self) -> usize {
        self.trade_num
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn exit_date(&self) -> NaiveDate {
        self.exit_date
    }

    pub fn exit_price(&self) -> f64 {
        self.exit_price
    }

    pub fn pnl_pct(&self) -> f64 {
        self.pnl_pct
    }

    pub fn pnl_dollar(&self) -> f64 {
        self.pnl_dollar
    }

    pub fn holding_days(&self) -> i64 {
        self.holding_days
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn entry_indicator(&self) -> Option<f64> {
        self.entry_indicator
    }

    pub fn exit_indicator(&self) -> Option<f64> {
        self.exit_indicator
    }
}

/// An entry with no later exit in the evaluated window.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub entry_indicator: Option<f64>,
}

/// Pair ENTRY and EXIT events into trades.
///
/// The i-th entry is matched with the first exit dated strictly after it,
/// searching all exits rather than the exit at index i. Only the first
/// `min(#entries, #exits)` entries are considered; an entry without a later
/// exit produces no trade. No trades is a valid result.
pub fn pair_trades(
    events: &[PositionEvent],
    initial_capital: f64,
) -> Result<Vec<Trade>, TradelensError> {
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(TradelensError::invalid_parameter(
            "initial_capital",
            initial_capital,
            "must be positive",
        ));
    }

    let entries: Vec<&PositionEvent> = events
        .iter()
        .filter(|e| e.kind == EventKind::Entry)
        .collect();
    let exits: Vec<&PositionEvent> = events
        .iter()
        .filter(|e| e.kind == EventKind::Exit)
        .collect();

    let mut trades = Vec::new();
    for (i, entry) in entries.iter().take(exits.len()).enumerate() {
        if let Some(exit) = exits.iter().find(|x| x.date > entry.date) {
            trades.push(Trade::from_events(i + 1, entry, exit, initial_capital));
        }
    }

    tracing::debug!(
        entries = entries.len(),
        exits = exits.len(),
        trades = trades.len(),
        "paired trades"
    );

    Ok(trades)
}

/// Entries that have no exit dated after them.
pub fn open_positions(events: &[PositionEvent]) -> Vec<OpenPosition> {
    let last_exit = events
        .iter()
        .filter(|e| e.kind == EventKind::Exit)
        .map(|e| e.date)
        .max();

    events
        .iter()
        .filter(|e| e.kind == EventKind::Entry)
        .filter(|e| last_exit.is_none_or(|x| x <= e.date))
        .map(|e| OpenPosition {
            entry_date: e.date,
            entry_price: e.price,
            entry_indicator: e.indicator,
        })
        .collect()
}
