//! OHLCV bar representation and price series validation.

use crate::domain::error::TradelensError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    fn check_prices(&self) -> Result<(), TradelensError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(TradelensError::invalid_input(format!(
                    "{} on {} must be finite and positive, got {}",
                    name, self.date, value
                )));
            }
        }
        if self.volume < 0 {
            return Err(TradelensError::invalid_input(format!(
                "volume on {} must be non-negative, got {}",
                self.date, self.volume
            )));
        }
        Ok(())
    }
}

/// Checks a price series before any strategy computation.
///
/// Rejects empty series, series shorter than `min_bars`, dates that are not
/// strictly increasing, and bars with non-positive or non-finite prices.
pub fn validate_series(bars: &[OhlcvBar], min_bars: usize) -> Result<(), TradelensError> {
    if bars.is_empty() {
        return Err(TradelensError::invalid_input("price series is empty"));
    }
    if bars.len() < min_bars {
        return Err(TradelensError::invalid_input(format!(
            "price series has {} bars, need at least {}",
            bars.len(),
            min_bars
        )));
    }
    for bar in bars {
        bar.check_prices()?;
    }
    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(TradelensError::invalid_input(format!(
                "dates must be strictly increasing: {} follows {}",
                pair[1].date, pair[0].date
            )));
        }
    }
    Ok(())
}
