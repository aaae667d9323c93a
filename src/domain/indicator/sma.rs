//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = (C[i-n+1] + ... + C[i]) / n, summed over the window at each bar.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::error::TradelensError;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, TradelensError> {
    if period == 0 {
        return Err(TradelensError::invalid_parameter(
            "period",
            period,
            "moving average period must be positive",
        ));
    }
    if period > bars.len() {
        return Err(TradelensError::invalid_parameter(
            "period",
            period,
            format!("exceeds series length {}", bars.len()),
        ));
    }

    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let valid = i + 1 >= period;
        let value = if valid {
            bars[i + 1 - period..=i].iter().map(|b| b.close).sum::<f64>() / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value,
        });
    }

    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    })
}
