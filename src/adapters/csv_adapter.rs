//! CSV file data adapter.
//!
//! One file per instrument at `<dir>/<CODE>.csv` with the header
//! `date,open,high,low,close,volume`.

use crate::domain::error::TradelensError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }

    fn read_all(&self, code: &str) -> Result<Vec<OhlcvBar>, TradelensError> {
        let path = self.csv_path(code);
        if !path.exists() {
            return Err(TradelensError::NoData {
                code: code.to_string(),
            });
        }
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| TradelensError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TradelensError::Database {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = field(&record, 0, "date")?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                TradelensError::Database {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            bars.push(OhlcvBar {
                code: code.to_string(),
                date,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        tracing::debug!(code, bars = bars.len(), path = %path.display(), "read csv prices");
        Ok(bars)
    }
}

fn field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'a str, TradelensError> {
    record.get(index).ok_or_else(|| TradelensError::Database {
        reason: format!("missing {} column", name),
    })
}

fn parse_field<T>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, TradelensError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    field(record, index, name)?
        .trim()
        .parse()
        .map_err(|e: T::Err| TradelensError::Database {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TradelensError> {
        let mut bars = self.read_all(code)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradelensError> {
        let bars = match self.read_all(code) {
            Ok(bars) => bars,
            Err(TradelensError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}
