//! retviz: daily return alignment and exploratory plots.
//!
//! Hexagonal architecture: the fetch, return and alignment pipeline lives in
//! [`domain`], port traits in [`ports`], concrete implementations in
//! [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
