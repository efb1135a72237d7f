//! Core domain types and logic.

pub mod align;
pub mod config_validation;
pub mod error;
pub mod instruments;
pub mod pipeline;
pub mod price;
pub mod render_options;
pub mod returns;
pub mod stats;
