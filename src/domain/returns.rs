//! Percent-change transform from prices to daily returns.
//!
//! return[i] = price[i] / price[i-1] - 1
//!
//! The first observation has no prior price and is dropped rather than
//! filled with a placeholder.

use crate::domain::error::RetvizError;
use crate::domain::price::{PricePoint, PriceSeries};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub symbol: String,
    pub points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Converts a price series into percent returns.
///
/// Fails on a zero price anywhere before the final observation, and on any
/// negative or non-finite price. Points are checked in date order and the
/// earliest problem is the one reported. A series with fewer than two
/// observations yields an empty result.
pub fn to_returns(series: &PriceSeries) -> Result<ReturnSeries, RetvizError> {
    let symbol = series.symbol();

    let mut points = Vec::with_capacity(series.len().saturating_sub(1));
    let mut prev: Option<&PricePoint> = None;
    for curr in series.points() {
        if let Some(prev) = prev.filter(|p| p.price == 0.0) {
            return Err(RetvizError::DivisionByZero {
                symbol: symbol.to_string(),
                date: prev.date,
            });
        }
        if !curr.price.is_finite() || curr.price < 0.0 {
            return Err(RetvizError::InvalidPrice {
                symbol: symbol.to_string(),
                date: curr.date,
                price: curr.price,
            });
        }
        if let Some(prev) = prev {
            points.push(ReturnPoint {
                date: curr.date,
                value: curr.price / prev.price - 1.0,
            });
        }
        prev = Some(curr);
    }

    Ok(ReturnSeries {
        symbol: symbol.to_string(),
        points,
    })
}
