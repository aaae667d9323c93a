//! Price data access port trait.

use crate::domain::error::TradelensError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code` within `[start_date, end_date]`, ordered by date.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TradelensError>;

    /// First date, last date and bar count held for `code`, or `None` when
    /// there is no data.
    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradelensError>;
}
