//! Performance metrics and statistics.

use super::drawdown::DrawdownEpisode;
use super::equity::{EquityPoint, FeatureTable};
use super::trade::{Outcome, Trade};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_equity: f64,
    pub buy_hold_final_equity: f64,
    pub total_return_pct: f64,
    pub buy_hold_return_pct: f64,
    pub annualized_return_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown_pct: f64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate_pct: f64,
    pub profit_factor: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub largest_win_pct: f64,
    pub largest_loss_pct: f64,
    pub avg_holding_days: f64,
    pub total_pnl_dollar: f64,
}

impl Metrics {
    pub fn compute(
        table: &FeatureTable,
        trades: &[Trade],
        drawdown: &DrawdownEpisode,
        risk_free_rate: f64,
    ) -> Self {
        let initial_capital = table.initial_capital;
        let strategy_curve = table.strategy_curve();

        let final_equity = strategy_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);
        let buy_hold_final_equity = table
            .buy_hold_curve()
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = (final_equity - initial_capital) / initial_capital;
        let buy_hold_return = (buy_hold_final_equity - initial_capital) / initial_capital;

        let trading_days = strategy_curve.len() as f64;
        let years = trading_days / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&strategy_curve, daily_rf);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_holding_days = 0i64;
        let mut total_pnl_dollar = 0.0_f64;

        for trade in trades {
            let pnl = trade.pnl_pct();
            match trade.outcome() {
                Outcome::Win => {
                    trades_won += 1;
                    total_wins += pnl;
                    largest_win = largest_win.max(pnl);
                }
                Outcome::Loss => {
                    trades_lost += 1;
                    total_losses += pnl.abs();
                    largest_loss = largest_loss.max(pnl.abs());
                }
            }
            total_holding_days += trade.holding_days();
            total_pnl_dollar += trade.pnl_dollar();
        }

        let total_trades = trades.len();
        let win_rate_pct = if total_trades > 0 {
            trades_won as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win_pct = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss_pct = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_holding_days = if total_trades > 0 {
            total_holding_days as f64 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            final_equity,
            buy_hold_final_equity,
            total_return_pct: total_return * 100.0,
            buy_hold_return_pct: buy_hold_return * 100.0,
            annualized_return_pct: annualized_return * 100.0,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown_pct: drawdown.max_drawdown_pct,
            total_trades,
            trades_won,
            trades_lost,
            win_rate_pct,
            profit_factor,
            avg_win_pct,
            avg_loss_pct,
            largest_win_pct: largest_win,
            largest_loss_pct: largest_loss,
            avg_holding_days,
            total_pnl_dollar,
        }
    }
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| (w[1].equity - w[0].equity) / w[0].equity)
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sum: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sum / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}
