//! Ingestion and aggregation layer for tempdwell.
//!
//! Reads delimited sensor exports, merges them into one ordered sample
//! series, splits the resulting step signal into UTC days and runs the
//! top-level analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod reader;

pub use tempdwell_core as core;
