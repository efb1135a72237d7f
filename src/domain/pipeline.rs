//! Fetch -> percent returns -> inner-join alignment.

use crate::domain::align::{AlignedTable, align};
use crate::domain::error::RetvizError;
use crate::domain::instruments::Instrument;
use crate::domain::price::PriceSeries;
use crate::domain::returns::to_returns;
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Fetches one instrument's prices, checking the range and that the provider
/// returned something.
pub fn fetch(
    port: &dyn MarketDataPort,
    symbol: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<PriceSeries, RetvizError> {
    if start_date > end_date {
        return Err(RetvizError::InvalidDateRange {
            start: start_date,
            end: end_date,
        });
    }

    let series = port.fetch_prices(symbol, start_date, end_date)?;
    if series.is_empty() {
        return Err(RetvizError::DataUnavailable {
            symbol: symbol.to_string(),
            start: start_date,
            end: end_date,
        });
    }

    debug!(
        provider = port.name(),
        symbol,
        observations = series.len(),
        "fetched prices"
    );
    Ok(series)
}

/// Builds the aligned return table for `instruments`, columns named by each
/// instrument's display name in the order given.
pub fn build_aligned_table(
    port: &dyn MarketDataPort,
    instruments: &[Instrument],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<AlignedTable, RetvizError> {
    let mut named = Vec::with_capacity(instruments.len());

    for instrument in instruments {
        let prices = fetch(port, &instrument.symbol, start_date, end_date)?;
        let returns = to_returns(&prices)?;
        info!(
            symbol = %instrument.symbol,
            prices = prices.len(),
            returns = returns.len(),
            "computed returns"
        );
        named.push((instrument.display_name().to_string(), returns));
    }

    let table = align(named)?;
    info!(
        rows = table.row_count(),
        columns = table.column_count(),
        "aligned return table"
    );
    Ok(table)
}
