//! Market data provider port.

use crate::domain::error::RetvizError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

/// Source of adjusted-close price series.
///
/// Implementations return one observation per trading day they have data for
/// in the inclusive range, and `RetvizError::DataUnavailable` when there is
/// none. Retry and timeout policy belong to the implementation.
pub trait MarketDataPort {
    fn name(&self) -> &str;

    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, RetvizError>;
}
