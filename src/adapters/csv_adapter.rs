//! CSV directory market data adapter, plus CSV export of aligned tables.
//!
//! Price files are `<base>/<SYMBOL>.csv` with a header row, in the layout
//! Yahoo Finance downloads use:
//!
//! ```text
//! Date,Open,High,Low,Close,Adj Close,Volume
//! 2021-01-04,375.31,375.45,364.82,368.79,359.19,110210800
//! ```
//!
//! The price column is the first of `Adj Close`, `adj_close`, `Close`,
//! `close` that is present.

use crate::domain::align::AlignedTable;
use crate::domain::error::RetvizError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DATE_COLUMNS: &[&str] = &["date"];
const PRICE_COLUMNS: &[&str] = &["adj close", "adj_close", "adjclose", "close"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn provider_error(reason: String) -> RetvizError {
        RetvizError::Provider {
            provider: "csv".to_string(),
            reason,
        }
    }

    /// Lists the symbols with a price file in the base directory.
    pub fn list_symbols(&self) -> Result<Vec<String>, RetvizError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            Self::provider_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| Self::provider_error(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|want| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(want))
    })
}

impl MarketDataPort for CsvAdapter {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, RetvizError> {
        let unavailable = || RetvizError::DataUnavailable {
            symbol: symbol.to_string(),
            start: start_date,
            end: end_date,
        };

        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "price file not found");
                return Err(unavailable());
            }
            Err(e) => {
                return Err(Self::provider_error(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| Self::provider_error(format!("CSV header error: {}", e)))?
            .clone();

        let date_col = find_column(&headers, DATE_COLUMNS).ok_or_else(|| {
            Self::provider_error(format!("{}: missing date column", path.display()))
        })?;
        let price_col = find_column(&headers, PRICE_COLUMNS).ok_or_else(|| {
            Self::provider_error(format!("{}: missing price column", path.display()))
        })?;

        let mut points = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let record =
                result.map_err(|e| Self::provider_error(format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(date_col)
                .ok_or_else(|| Self::provider_error("missing date value".into()))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                Self::provider_error(format!("invalid date '{}': {}", date_str, e))
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let price_str = record.get(price_col).unwrap_or("").trim();
            if price_str.is_empty() || price_str.eq_ignore_ascii_case("null") {
                skipped += 1;
                continue;
            }
            let price: f64 = price_str.parse().map_err(|e| {
                Self::provider_error(format!("invalid price '{}' on {}: {}", price_str, date, e))
            })?;

            points.push(PricePoint::new(date, price));
        }

        if skipped > 0 {
            warn!(symbol, skipped, "skipped rows without a price");
        }
        if points.is_empty() {
            return Err(unavailable());
        }

        PriceSeries::new(symbol, points)
    }
}

/// Writes the full table as CSV: a `Date` column followed by one column per
/// instrument.
pub fn write_table<W: Write>(table: &AlignedTable, writer: W) -> Result<(), RetvizError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let to_io = |e: csv::Error| RetvizError::Io(std::io::Error::other(e));

    let mut header = vec!["Date".to_string()];
    header.extend(table.columns().iter().cloned());
    wtr.write_record(&header).map_err(to_io)?;

    for (date, values) in table.rows() {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(values.iter().map(|v| v.to_string()));
        wtr.write_record(&record).map_err(to_io)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_table_file(table: &AlignedTable, path: &Path) -> Result<(), RetvizError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_table(table, file)
}
