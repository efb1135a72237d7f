//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for retviz.
#[derive(Debug, thiserror::Error)]
pub enum RetvizError {
    #[error("no data for {symbol} between {start} and {end}")]
    DataUnavailable {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("division by zero in {symbol}: price on {date} is zero")]
    DivisionByZero { symbol: String, date: NaiveDate },

    #[error("no dates common to all series ({})", columns.join(", "))]
    EmptyIntersection { columns: Vec<String> },

    #[error("invalid price for {symbol} on {date}: {price}")]
    InvalidPrice {
        symbol: String,
        date: NaiveDate,
        price: f64,
    },

    #[error("invalid series {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("alignment needs at least two series, got {count}")]
    TooFewSeries { count: usize },

    #[error("duplicate column: {name}")]
    DuplicateColumn { name: String },

    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid {option}: {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("{provider} provider error: {reason}")]
    Provider { provider: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RetvizError> for std::process::ExitCode {
    fn from(err: &RetvizError) -> Self {
        let code: u8 = match err {
            RetvizError::Io(_) => 1,
            RetvizError::ConfigParse { .. }
            | RetvizError::ConfigMissing { .. }
            | RetvizError::ConfigInvalid { .. } => 2,
            RetvizError::Provider { .. } => 3,
            RetvizError::DataUnavailable { .. }
            | RetvizError::InvalidSeries { .. }
            | RetvizError::InvalidPrice { .. } => 4,
            RetvizError::DivisionByZero { .. }
            | RetvizError::EmptyIntersection { .. }
            | RetvizError::TooFewSeries { .. }
            | RetvizError::DuplicateColumn { .. }
            | RetvizError::InvalidDateRange { .. }
            | RetvizError::InvalidOption { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
