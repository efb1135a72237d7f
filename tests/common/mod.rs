#![allow(dead_code)]

use chrono::NaiveDate;
use retviz::domain::error::RetvizError;
use retviz::domain::price::{PricePoint, PriceSeries};
use retviz::ports::market_data_port::MarketDataPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub struct MockMarketDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<String>>,
}

impl MockMarketDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_prices(mut self, symbol: &str, prices: &[(impl AsRef<str>, f64)]) -> Self {
        let points = prices
            .iter()
            .map(|(d, p)| PricePoint::new(date(d.as_ref()), *p))
            .collect();
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketDataPort {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, RetvizError> {
        self.requests.borrow_mut().push(symbol.to_string());
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RetvizError::Provider {
                provider: "mock".to_string(),
                reason: reason.clone(),
            });
        }
        let points = self
            .data
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        PriceSeries::new(symbol, points)
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Consecutive calendar days starting at `start`, one per price.
pub fn daily(start: &str, prices: &[f64]) -> Vec<(String, f64)> {
    let first = date(start);
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let d = first + chrono::Duration::days(i as i64);
            (d.format("%Y-%m-%d").to_string(), p)
        })
        .collect()
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Writes `<dir>/<symbol>.csv` in the Yahoo download layout.
pub fn write_price_csv(dir: &Path, symbol: &str, rows: &[(&str, f64)]) {
    let mut content = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for (d, p) in rows {
        content.push_str(&format!("{d},{p},{p},{p},{p},{p},1000\n"));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

pub fn exit_code_eq(actual: std::process::ExitCode, expected: u8) -> bool {
    format!("{:?}", actual) == format!("{:?}", std::process::ExitCode::from(expected))
}
