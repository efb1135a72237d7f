//! Configuration validation.
//!
//! Validates the `[data]` and `[render]` sections and builds the typed values
//! the pipeline and renderer consume.

use crate::domain::error::RetvizError;
use crate::domain::instruments::{Instrument, parse_instruments};
use crate::domain::render_options::{ColorMap, HistMultiple, RenderOptions};
use crate::domain::stats::MAX_BINS;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_CSV_DIR: &str = "data";

/// Where price data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Csv { dir: String },
    Yahoo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub source: DataSource,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub instruments: Vec<Instrument>,
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), RetvizError> {
    build_data_config(config)?;
    build_render_options(config)?;
    Ok(())
}

pub fn build_data_config(config: &dyn ConfigPort) -> Result<DataConfig, RetvizError> {
    let start_date = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(RetvizError::ConfigInvalid {
            section: "data".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }

    Ok(DataConfig {
        source: build_source(config)?,
        start_date,
        end_date,
        instruments: build_instruments(config)?,
    })
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, RetvizError> {
    match value {
        None => Err(RetvizError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            RetvizError::ConfigInvalid {
                section: "data".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn build_source(config: &dyn ConfigPort) -> Result<DataSource, RetvizError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.trim().to_lowercase().as_str() {
        "csv" => {
            let dir = config
                .get_string("data", "csv_dir")
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CSV_DIR.to_string());
            Ok(DataSource::Csv { dir })
        }
        "yahoo" => Ok(DataSource::Yahoo),
        other => Err(RetvizError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("unknown source '{other}', expected csv or yahoo"),
        }),
    }
}

fn build_instruments(config: &dyn ConfigPort) -> Result<Vec<Instrument>, RetvizError> {
    let raw = config
        .get_string("data", "instruments")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| RetvizError::ConfigMissing {
            section: "data".to_string(),
            key: "instruments".to_string(),
        })?;

    let instruments = parse_instruments(&raw).map_err(|e| RetvizError::ConfigInvalid {
        section: "data".to_string(),
        key: "instruments".to_string(),
        reason: e.to_string(),
    })?;

    if instruments.len() < 2 {
        return Err(RetvizError::ConfigInvalid {
            section: "data".to_string(),
            key: "instruments".to_string(),
            reason: "at least two instruments are required".to_string(),
        });
    }
    Ok(instruments)
}

pub fn build_render_options(config: &dyn ConfigPort) -> Result<RenderOptions, RetvizError> {
    let invalid = |key: &str, reason: String| RetvizError::ConfigInvalid {
        section: "render".to_string(),
        key: key.to_string(),
        reason,
    };

    let bins = match config.get_string("render", "bins") {
        None => None,
        Some(s) => match s.trim().parse::<usize>() {
            Ok(0) | Err(_) => {
                return Err(invalid("bins", "bins must be a positive integer".to_string()));
            }
            Ok(n) if n > MAX_BINS => {
                return Err(invalid("bins", format!("bins must be at most {MAX_BINS}")));
            }
            Ok(n) => Some(n),
        },
    };

    let multiple = match config.get_string("render", "multiple") {
        None => HistMultiple::default(),
        Some(s) => s.parse().map_err(|e| invalid("multiple", e))?,
    };

    let cmap = match config.get_string("render", "cmap") {
        None => ColorMap::default(),
        Some(s) => s.parse().map_err(|e| invalid("cmap", e))?,
    };

    let vmin = parse_bound(config, "vmin")?;
    let vmax = parse_bound(config, "vmax")?;
    if let (Some(lo), Some(hi)) = (vmin, vmax) {
        if lo >= hi {
            return Err(invalid("vmin", "vmin must be less than vmax".to_string()));
        }
    }

    Ok(RenderOptions {
        bins,
        multiple,
        vmin,
        vmax,
        annot: config.get_bool("render", "annot", false),
        cmap,
    })
}

fn parse_bound(config: &dyn ConfigPort, key: &str) -> Result<Option<f64>, RetvizError> {
    match config.get_string("render", key) {
        None => Ok(None),
        Some(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(RetvizError::ConfigInvalid {
                section: "render".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be a finite number"),
            }),
        },
    }
}
