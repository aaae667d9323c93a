//! CSV report adapter implementing ReportPort.
//!
//! Writes three files into the output directory:
//! - `features.csv`: the augmented strategy table, one row per date
//! - `trades.csv`: closed trades
//! - `drawdown.csv`: running maximum and drawdown per date
//!
//! Undefined values (first-row returns, missing indicators) are written as
//! empty cells.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::drawdown::DrawdownPoint;
use crate::domain::equity::FeatureTable;
use crate::domain::error::TradelensError;
use crate::domain::trade::Trade;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn report_error(e: impl std::fmt::Display) -> TradelensError {
    TradelensError::Report {
        reason: e.to_string(),
    }
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, TradelensError> {
    let data = wtr.into_inner().map_err(report_error)?;
    String::from_utf8(data).map_err(report_error)
}

pub fn features_csv(table: &FeatureTable) -> Result<String, TradelensError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["date".to_string(), "close".to_string()];
    header.extend(table.indicators.iter().map(|i| i.to_string()));
    header.extend(
        [
            "position",
            "signal",
            "market_return",
            "strategy_return",
            "strategy_equity",
            "buy_hold_equity",
        ]
        .map(String::from),
    );
    wtr.write_record(&header).map_err(report_error)?;

    for row in &table.rows {
        let mut record = vec![row.date.to_string(), format!("{:.6}", row.close)];
        record.extend(row.indicators.iter().map(|v| format!("{:.6}", v)));
        record.push(row.state.as_i8().to_string());
        record.push(row.change.to_string());
        record.push(opt(row.market_return));
        record.push(opt(row.strategy_return));
        record.push(format!("{:.2}", row.strategy_equity));
        record.push(format!("{:.2}", row.buy_hold_equity));
        wtr.write_record(&record).map_err(report_error)?;
    }

    finish(wtr)
}

pub fn trades_csv(trades: &[Trade]) -> Result<String, TradelensError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "trade_num",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "pnl_pct",
        "pnl_dollar",
        "holding_days",
        "outcome",
        "entry_indicator",
        "exit_indicator",
    ])
    .map_err(report_error)?;

    for t in trades {
        wtr.write_record([
            &t.trade_num().to_string(),
            &t.entry_date().to_string(),
            &format!("{:.6}", t.entry_price()),
            &t.exit_date().to_string(),
            &format!("{:.6}", t.exit_price()),
            &format!("{:.4}", t.pnl_pct()),
            &format!("{:.2}", t.pnl_dollar()),
            &t.holding_days().to_string(),
            &t.outcome().to_string(),
            &opt(t.entry_indicator()),
            &opt(t.exit_indicator()),
        ])
        .map_err(report_error)?;
    }

    finish(wtr)
}

pub fn drawdown_csv(points: &[DrawdownPoint]) -> Result<String, TradelensError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "equity",
        "running_max",
        "drawdown_dollars",
        "drawdown_pct",
    ])
    .map_err(report_error)?;

    for p in points {
        wtr.write_record([
            &p.date.to_string(),
            &format!("{:.2}", p.equity),
            &format!("{:.2}", p.running_max),
            &format!("{:.2}", p.drawdown_dollars),
            &format!("{:.4}", p.drawdown_pct),
        ])
        .map_err(report_error)?;
    }

    finish(wtr)
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        strategy_name: &str,
        output_dir: &Path,
    ) -> Result<(), TradelensError> {
        fs::create_dir_all(output_dir)?;

        let files = [
            ("features.csv", features_csv(&result.table)?),
            ("trades.csv", trades_csv(&result.trades)?),
            ("drawdown.csv", drawdown_csv(&result.drawdown.points)?),
        ];
        for (name, content) in &files {
            fs::write(output_dir.join(name), content)?;
        }

        tracing::info!(
            strategy = strategy_name,
            dir = %output_dir.display(),
            rows = result.table.rows.len(),
            trades = result.trades.len(),
            "wrote csv report"
        );
        Ok(())
    }
}
