//! Strategy selection and parameters.

use crate::domain::error::TradelensError;
use crate::domain::signal::{MaCrossover, RsiMeanReversion, SignalGenerator};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    MaCrossover,
    RsiMeanReversion,
}

impl FromStr for StrategyKind {
    type Err = TradelensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ma_crossover" => Ok(StrategyKind::MaCrossover),
            "rsi_mean_reversion" => Ok(StrategyKind::RsiMeanReversion),
            other => Err(TradelensError::invalid_parameter(
                "kind",
                other,
                "expected ma_crossover or rsi_mean_reversion",
            )),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::MaCrossover => write!(f, "ma_crossover"),
            StrategyKind::RsiMeanReversion => write!(f, "rsi_mean_reversion"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyConfig {
    MaCrossover {
        fast_period: usize,
        slow_period: usize,
    },
    RsiMeanReversion {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
}

impl StrategyConfig {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyConfig::MaCrossover { .. } => StrategyKind::MaCrossover,
            StrategyConfig::RsiMeanReversion { .. } => StrategyKind::RsiMeanReversion,
        }
    }

    /// Validates the parameters and builds the signal generator.
    pub fn build(&self) -> Result<Box<dyn SignalGenerator>, TradelensError> {
        match *self {
            StrategyConfig::MaCrossover {
                fast_period,
                slow_period,
            } => Ok(Box::new(MaCrossover::new(fast_period, slow_period)?)),
            StrategyConfig::RsiMeanReversion {
                period,
                oversold,
                overbought,
            } => Ok(Box::new(RsiMeanReversion::new(
                period, oversold, overbought,
            )?)),
        }
    }
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyConfig::MaCrossover {
                fast_period,
                slow_period,
            } => write!(f, "MA crossover SMA({}) / SMA({})", fast_period, slow_period),
            StrategyConfig::RsiMeanReversion {
                period,
                oversold,
                overbought,
            } => write!(
                f,
                "RSI({}) mean reversion, buy < {}, sell > {}",
                period, oversold, overbought
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_str() {
        assert_eq!(
            "ma_crossover".parse::<StrategyKind>().unwrap(),
            StrategyKind::MaCrossover
        );
        assert_eq!(
            " RSI_Mean_Reversion ".parse::<StrategyKind>().unwrap(),
            StrategyKind::RsiMeanReversion
        );
        assert!("breakout".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn kind_display_round_trips() {
        for kind in [StrategyKind::MaCrossover, StrategyKind::RsiMeanReversion] {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn build_ma_crossover() {
        let config = StrategyConfig::MaCrossover {
            fast_period: 50,
            slow_period: 200,
        };
        let generator = config.build().unwrap();
        assert_eq!(generator.name(), "ma_crossover");
        assert_eq!(generator.warmup_bars(), 200);
        assert_eq!(generator.min_bars(), 202);
        assert_eq!(config.kind(), StrategyKind::MaCrossover);
    }

    #[test]
    fn build_rsi() {
        let config = StrategyConfig::RsiMeanReversion {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        };
        let generator = config.build().unwrap();
        assert_eq!(generator.name(), "rsi_mean_reversion");
        assert_eq!(generator.min_bars(), 16);
    }

    #[test]
    fn build_rejects_invalid_parameters() {
        let config = StrategyConfig::MaCrossover {
            fast_period: 200,
            slow_period: 50,
        };
        assert!(matches!(
            config.build(),
            Err(TradelensError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn display() {
        let config = StrategyConfig::MaCrossover {
            fast_period: 20,
            slow_period: 50,
        };
        assert_eq!(config.to_string(), "MA crossover SMA(20) / SMA(50)");
    }
}
