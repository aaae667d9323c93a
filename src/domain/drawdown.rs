//! Drawdown analysis over an equity curve.
//!
//! running_max[t] = max(equity[0..=t])
//! drawdown_pct[t] = (equity[t] - running_max[t]) / running_max[t] * 100, always <= 0
//!
//! The maximum drawdown episode runs from the last peak before the deepest
//! point (leftmost on ties) to the first later date that regains the peak.

use crate::domain::equity::EquityPoint;
use crate::domain::error::TradelensError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub equity: f64,
    pub running_max: f64,
    pub drawdown_dollars: f64,
    pub drawdown_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownEpisode {
    pub peak_date: NaiveDate,
    pub peak_equity: f64,
    pub trough_date: NaiveDate,
    pub trough_equity: f64,
    /// `None` while the curve has not regained the peak.
    pub recovery_date: Option<NaiveDate>,
    pub max_drawdown_pct: f64,
    pub max_drawdown_dollars: f64,
    pub drawdown_duration_days: Option<i64>,
    pub recovery_duration_days: Option<i64>,
    pub total_duration_days: Option<i64>,
}

impl DrawdownEpisode {
    pub fn is_recovered(&self) -> bool {
        self.recovery_date.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownAnalysis {
    pub points: Vec<DrawdownPoint>,
    pub episode: DrawdownEpisode,
}

pub fn drawdown_series(curve: &[EquityPoint]) -> Result<Vec<DrawdownPoint>, TradelensError> {
    let mut points = Vec::with_capacity(curve.len());
    let mut running_max = f64::NEG_INFINITY;

    for point in curve {
        if !point.equity.is_finite() || point.equity <= 0.0 {
            return Err(TradelensError::invalid_input(format!(
                "equity on {} must be finite and positive, got {}",
                point.date, point.equity
            )));
        }
        running_max = running_max.max(point.equity);
        let drawdown_dollars = point.equity - running_max;
        points.push(DrawdownPoint {
            date: point.date,
            equity: point.equity,
            running_max,
            drawdown_dollars,
            drawdown_pct: drawdown_dollars / running_max * 100.0,
        });
    }

    Ok(points)
}

pub fn analyze_drawdown(curve: &[EquityPoint]) -> Result<DrawdownAnalysis, TradelensError> {
    if curve.is_empty() {
        return Err(TradelensError::invalid_input("equity curve is empty"));
    }
    let points = drawdown_series(curve)?;

    let mut trough = 0;
    for (i, p) in points.iter().enumerate() {
        if p.drawdown_pct < points[trough].drawdown_pct {
            trough = i;
        }
    }

    let trough_point = &points[trough];
    let peak_value = trough_point.running_max;
    let peak = (0..=trough)
        .rev()
        .find(|&i| points[i].equity >= peak_value)
        .unwrap_or(0);

    let recovery = if trough_point.drawdown_pct == 0.0 {
        Some(trough)
    } else {
        points
            .iter()
            .enumerate()
            .skip(trough + 1)
            .find(|(_, p)| p.equity >= points[peak].equity)
            .map(|(i, _)| i)
    };

    let peak_date = points[peak].date;
    let trough_date = trough_point.date;
    let recovery_date = recovery.map(|i| points[i].date);

    let episode = DrawdownEpisode {
        peak_date,
        peak_equity: points[peak].equity,
        trough_date,
        trough_equity: trough_point.equity,
        recovery_date,
        max_drawdown_pct: trough_point.drawdown_pct,
        max_drawdown_dollars: trough_point.drawdown_dollars,
        drawdown_duration_days: recovery_date.map(|_| (trough_date - peak_date).num_days()),
        recovery_duration_days: recovery_date.map(|r| (r - trough_date).num_days()),
        total_duration_days: recovery_date.map(|r| (r - peak_date).num_days()),
    };

    tracing::debug!(
        max_drawdown_pct = episode.max_drawdown_pct,
        peak = %episode.peak_date,
        trough = %episode.trough_date,
        recovered = episode.is_recovered(),
        "analyzed drawdown"
    );

    Ok(DrawdownAnalysis { points, episode })
}
