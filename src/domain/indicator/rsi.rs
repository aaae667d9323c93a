//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses exponentially weighted averages of gains and losses:
//! - alpha = 2 / (n + 1)
//! - avg[i] = avg[i-1] + alpha * (x[i] - avg[i-1]), seeded by the first observation
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: bar 0 is invalid (no price change yet). The first bar's gain and
//! loss are both zero and seed the averages.

use crate::domain::error::TradelensError;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, TradelensError> {
    if period == 0 {
        return Err(TradelensError::invalid_parameter(
            "rsi_period",
            period,
            "RSI period must be positive",
        ));
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(bars.len());
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: 0.0,
            });
            continue;
        }

        let change = bar.close - bars[i - 1].close;
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        avg_gain += alpha * (gain - avg_gain);
        avg_loss += alpha * (loss - avg_loss);

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid: true,
            value: rsi,
        });
    }

    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(date: &str, close: f64) -> OhlcvBar {
        OhlcvBar {
            code: "TEST".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| make_bar(&format!("2024-01-{:02}", i + 1), close))
            .collect()
    }

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14).unwrap();
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_bar() {
        let bars = vec![make_bar("2024-01-01", 100.0)];
        let series = calculate_rsi(&bars, 14).unwrap();
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].valid);
    }

    #[test]
    fn rsi_same_length_as_input() {
        let bars = make_bars(&[10.0, 11.0, 10.5, 12.0, 11.0]);
        let series = calculate_rsi(&bars, 14).unwrap();
        assert_eq!(series.values.len(), bars.len());
        assert!(!series.values[0].valid);
        assert!(series.values[1..].iter().all(|p| p.valid));
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_bars(&prices), 14).unwrap();
        assert!(
            (series.values[14].value - 100.0).abs() < f64::EPSILON,
            "RSI should be 100 when all gains"
        );
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_bars(&prices), 14).unwrap();
        assert!(
            series.values[14].value.abs() < f64::EPSILON,
            "RSI should be 0 when all losses"
        );
    }

    #[test]
    fn rsi_flat_prices_report_100() {
        let series = calculate_rsi(&make_bars(&[50.0, 50.0, 50.0]), 3).unwrap();
        assert!((series.values[2].value - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_known_calculation() {
        // alpha = 0.5
        // bar 1: gain 1 -> avg_gain 0.5, avg_loss 0 -> 100
        // bar 2: loss 1 -> avg_gain 0.25, avg_loss 0.5 -> 100 - 100/1.5
        let series = calculate_rsi(&make_bars(&[10.0, 11.0, 10.0]), 3).unwrap();
        assert!((series.values[1].value - 100.0).abs() < 1e-9);
        assert!((series.values[2].value - (100.0 - 100.0 / 1.5)).abs() < 1e-9);
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (1..=20)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        let series = calculate_rsi(&make_bars(&prices), 14).unwrap();

        for point in series.values.iter().filter(|p| p.valid) {
            assert!(
                (0.0..=100.0).contains(&point.value),
                "RSI {} out of range",
                point.value
            );
        }
    }

    #[test]
    fn rsi_indicator_type() {
        let series = calculate_rsi(&make_bars(&[100.0]), 14).unwrap();
        assert_eq!(series.indicator_type, IndicatorType::Rsi(14));
    }

    #[test]
    fn rsi_zero_period_rejected() {
        let err = calculate_rsi(&make_bars(&[100.0, 101.0]), 0).unwrap_err();
        assert!(
            matches!(err, TradelensError::InvalidParameter { name, .. } if name == "rsi_period")
        );
    }
}
