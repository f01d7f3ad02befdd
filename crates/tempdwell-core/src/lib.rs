//! Shared types and utilities for tempdwell.
//!
//! Holds the sample and statistics models, the error type, UTC timestamp
//! helpers, number formatting and the command-line settings used by the
//! binary.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{DwellError, Result};
