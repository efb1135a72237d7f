//! Yahoo Finance market data adapter.
//!
//! Fetches daily adjusted closes from Yahoo's v8 chart API. Transport
//! failures and 5xx responses are retried with exponential backoff; a
//! "Not Found" chart error or an empty result maps to `DataUnavailable`.

use crate::domain::error::RetvizError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooAdapter {
    pub fn new() -> Result<Self, RetvizError> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, RetvizError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| Self::provider_error(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn provider_error(reason: String) -> RetvizError {
        RetvizError::Provider {
            provider: "yahoo".to_string(),
            reason,
        }
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
        let end_ts = end
            .and_hms_opt(23, 59, 59)
            .map_or(0, |dt| dt.and_utc().timestamp());
        format!(
            "{}/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d&includeAdjustedClose=true",
            self.base_url
        )
    }

    fn fetch_body(&self, url: &str) -> Result<String, RetvizError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(attempt, ?delay, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    // 404 still carries a chart error body worth parsing
                    if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
                        return resp
                            .text()
                            .map_err(|e| Self::provider_error(format!("failed to read body: {e}")));
                    }
                    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    {
                        warn!(%status, attempt, "Yahoo request failed");
                        last_error = Some(Self::provider_error(format!("HTTP {status}")));
                        continue;
                    }
                    return Err(Self::provider_error(format!("HTTP {status}")));
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!(error = %e, attempt, "Yahoo request failed");
                    last_error = Some(Self::provider_error(e.to_string()));
                }
                Err(e) => return Err(Self::provider_error(e.to_string())),
            }
        }

        Err(last_error.unwrap_or_else(|| Self::provider_error("max retries exceeded".into())))
    }
}

/// Parses a chart API body into adjusted-close points within the range.
/// Days without a price (holidays, halts) are skipped.
fn parse_chart(
    symbol: &str,
    body: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PricePoint>, RetvizError> {
    let unavailable = || RetvizError::DataUnavailable {
        symbol: symbol.to_string(),
        start,
        end,
    };

    let resp: ChartResponse = serde_json::from_str(body)
        .map_err(|e| YahooAdapter::provider_error(format!("unexpected response format: {e}")))?;

    let Some(results) = resp.chart.result else {
        return match resp.chart.error {
            Some(err) if err.code == "Not Found" => Err(unavailable()),
            Some(err) => Err(YahooAdapter::provider_error(format!(
                "{}: {}",
                err.code, err.description
            ))),
            None => Err(unavailable()),
        };
    };

    let Some(data) = results.into_iter().next() else {
        return Err(unavailable());
    };
    let timestamps = data.timestamp.unwrap_or_default();

    let prices: Vec<Option<f64>> = match data.indicators.adjclose.and_then(|v| v.into_iter().next()) {
        Some(adj) => adj.adjclose,
        None => data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default(),
    };

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| YahooAdapter::provider_error(format!("invalid timestamp: {ts}")))?;
        if date < start || date > end {
            continue;
        }
        if let Some(price) = prices.get(i).copied().flatten() {
            points.push(PricePoint::new(date, price));
        }
    }

    Ok(points)
}

impl MarketDataPort for YahooAdapter {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, RetvizError> {
        let url = self.chart_url(symbol, start_date, end_date);
        debug!(%url, "requesting chart");
        let body = self.fetch_body(&url)?;
        let points = parse_chart(symbol, &body, start_date, end_date)?;

        if points.is_empty() {
            return Err(RetvizError::DataUnavailable {
                symbol: symbol.to_string(),
                start: start_date,
                end: end_date,
            });
        }
        PriceSeries::new(symbol, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2021-01-04, 2021-01-05, 2021-01-06 at 14:30 UTC
    const BODY: &str = r#"{"chart":{"result":[{
        "timestamp":[1609770600,1609857000,1609943400],
        "indicators":{
            "quote":[{"close":[368.79,371.33,373.55]}],
            "adjclose":[{"adjclose":[359.19,null,363.82]}]
        }}],"error":null}}"#;

    #[test]
    fn parses_adjusted_close_and_skips_gaps() {
        let points = parse_chart("SPY", BODY, date(2021, 1, 1), date(2021, 1, 31)).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date(2021, 1, 4));
        assert_eq!(points[0].price, 359.19);
        assert_eq!(points[1].date, date(2021, 1, 6));
    }

    #[test]
    fn filters_to_requested_range() {
        let points = parse_chart("SPY", BODY, date(2021, 1, 6), date(2021, 1, 6)).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn falls_back_to_close_without_adjclose() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1609770600],
            "indicators":{"quote":[{"close":[368.79]}]}}],"error":null}}"#;
        let points = parse_chart("SPY", body, date(2021, 1, 1), date(2021, 1, 31)).unwrap();
        assert_eq!(points[0].price, 368.79);
    }

    #[test]
    fn not_found_is_unavailable() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let result = parse_chart("NOPE", body, date(2021, 1, 1), date(2021, 1, 31));
        assert!(matches!(
            result,
            Err(RetvizError::DataUnavailable { symbol, .. }) if symbol == "NOPE"
        ));
    }

    #[test]
    fn other_chart_error_is_provider_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        let result = parse_chart("SPY", body, date(2021, 1, 1), date(2021, 1, 31));
        assert!(matches!(result, Err(RetvizError::Provider { .. })));
    }

    #[test]
    fn garbage_is_provider_error() {
        let result = parse_chart("SPY", "<html>", date(2021, 1, 1), date(2021, 1, 31));
        assert!(matches!(result, Err(RetvizError::Provider { .. })));
    }

    #[test]
    fn chart_url_covers_whole_days() {
        let adapter = YahooAdapter::with_base_url("http://localhost").unwrap();
        let url = adapter.chart_url("SPY", date(2021, 1, 1), date(2021, 1, 1));
        assert_eq!(
            url,
            "http://localhost/SPY?period1=1609459200&period2=1609545599&interval=1d&includeAdjustedClose=true"
        );
    }
}
