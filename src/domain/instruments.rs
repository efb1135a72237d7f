//! Instrument list parsing.
//!
//! An instrument list is a comma-separated set of tokens, each either
//! `SYMBOL` or `SYMBOL:Label`. The label becomes the column name in the
//! aligned table.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub symbol: String,
    pub label: Option<String>,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Column name in the aligned table.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.symbol)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum InstrumentError {
    #[error("empty token in instrument list")]
    EmptyToken,

    #[error("empty symbol in token '{0}'")]
    EmptySymbol(String),

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("duplicate column name: {0}")]
    DuplicateName(String),
}

pub fn parse_instruments(input: &str) -> Result<Vec<Instrument>, InstrumentError> {
    let mut instruments = Vec::new();
    let mut symbols = HashSet::new();
    let mut names = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(InstrumentError::EmptyToken);
        }

        let (symbol, label) = match trimmed.split_once(':') {
            Some((s, l)) => (s.trim(), Some(l.trim()).filter(|l| !l.is_empty())),
            None => (trimmed, None),
        };
        if symbol.is_empty() {
            return Err(InstrumentError::EmptySymbol(trimmed.to_string()));
        }

        let symbol = symbol.to_uppercase();
        if !symbols.insert(symbol.clone()) {
            return Err(InstrumentError::DuplicateSymbol(symbol));
        }

        let mut instrument = Instrument::new(symbol);
        if let Some(label) = label {
            instrument = instrument.with_label(label);
        }

        let name = instrument.display_name().to_string();
        if !names.insert(name.clone()) {
            return Err(InstrumentError::DuplicateName(name));
        }

        instruments.push(instrument);
    }

    Ok(instruments)
}
