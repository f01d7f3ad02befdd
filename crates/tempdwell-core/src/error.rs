use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by tempdwell.
#[derive(Error, Debug)]
pub enum DwellError {
    /// A document's header row lacks a required column.
    #[error("Malformed input in {document}: missing required column \"{column}\"")]
    MalformedInput { document: String, column: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input path given on the command line does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// A directory was given but contained no CSV files.
    #[error("No CSV files found in {0}")]
    NoInputFiles(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The report could not be serialised as JSON.
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The report could not be written as CSV.
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the tempdwell crates.
pub type Result<T> = std::result::Result<T, DwellError>;
