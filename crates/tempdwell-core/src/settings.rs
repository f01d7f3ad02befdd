use clap::Parser;
use std::path::PathBuf;

use crate::error::{DwellError, Result};
use crate::models::ThresholdMode;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Time-weighted daily statistics for sensor state exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tempdwell",
    about = "Time-weighted daily statistics for sensor state exports",
    version
)]
pub struct Settings {
    /// CSV files, or directories to search for CSV files
    #[arg(required = true, num_args = 1.., value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Values strictly below this count as time below threshold
    #[arg(long, default_value = "0", env = "TEMPDWELL_THRESHOLD", allow_negative_numbers = true)]
    pub threshold: f64,

    /// Count values equal to the threshold as below it
    #[arg(long)]
    pub inclusive_threshold: bool,

    /// Header name of the numeric reading column
    #[arg(long, default_value = "state", env = "TEMPDWELL_VALUE_COLUMN")]
    pub value_column: String,

    /// Header name of the UTC timestamp column
    #[arg(long, default_value = "last_changed", env = "TEMPDWELL_TIMESTAMP_COLUMN")]
    pub timestamp_column: String,

    /// Field delimiter of the input files
    #[arg(long, default_value = ",")]
    pub delimiter: char,

    /// Report format
    #[arg(long, default_value = "csv", value_parser = ["csv", "json", "text"])]
    pub format: String,

    /// Write the report to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "WARNING", env = "TEMPDWELL_LOG_LEVEL", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments, exiting with a usage message on error.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Parse an explicit argument list (the first item is the binary name).
    pub fn load_from<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    /// Apply the `--debug` flag.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Check values clap cannot validate on its own.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(DwellError::Config(format!(
                "threshold must be a finite number, got {}",
                self.threshold
            )));
        }
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '\n' | '\r' | '"') {
            return Err(DwellError::Config(format!(
                "unsupported delimiter {:?}",
                self.delimiter
            )));
        }
        if self.value_column.trim().is_empty() || self.timestamp_column.trim().is_empty() {
            return Err(DwellError::Config("column names must not be empty".to_string()));
        }
        if self.value_column.eq_ignore_ascii_case(&self.timestamp_column) {
            return Err(DwellError::Config(format!(
                "value and timestamp columns must differ, both are \"{}\"",
                self.value_column
            )));
        }
        Ok(())
    }

    pub fn threshold_mode(&self) -> ThresholdMode {
        if self.inclusive_threshold {
            ThresholdMode::Inclusive
        } else {
            ThresholdMode::Strict
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Settings {
        let mut full = vec!["tempdwell"];
        full.extend_from_slice(args);
        Settings::load_from(full).expect("valid arguments")
    }

    // ── parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_defaults() {
        let s = parse(&["readings.csv"]);
        assert_eq!(s.paths, vec![PathBuf::from("readings.csv")]);
        assert_eq!(s.threshold, 0.0);
        assert!(!s.inclusive_threshold);
        assert_eq!(s.value_column, "state");
        assert_eq!(s.timestamp_column, "last_changed");
        assert_eq!(s.delimiter, ',');
        assert_eq!(s.format, "csv");
        assert!(s.output.is_none());
        assert_eq!(s.log_level, "WARNING");
        assert_eq!(s.threshold_mode(), ThresholdMode::Strict);
    }

    #[test]
    fn test_multiple_paths() {
        let s = parse(&["a.csv", "b.csv", "dir"]);
        assert_eq!(s.paths.len(), 3);
    }

    #[test]
    fn test_no_paths_is_an_error() {
        assert!(Settings::load_from(["tempdwell"]).is_err());
    }

    #[test]
    fn test_negative_threshold() {
        let s = parse(&["--threshold", "-2.5", "a.csv"]);
        assert_eq!(s.threshold, -2.5);
    }

    #[test]
    fn test_inclusive_threshold_flag() {
        let s = parse(&["--inclusive-threshold", "a.csv"]);
        assert_eq!(s.threshold_mode(), ThresholdMode::Inclusive);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Settings::load_from(["tempdwell", "--format", "xml", "a.csv"]).is_err());
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let s = parse(&["--debug", "--log-level", "ERROR", "a.csv"]);
        assert_eq!(s.log_level, "DEBUG");
    }

    // ── validate ──────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(parse(&["a.csv"]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite_threshold() {
        let mut s = parse(&["a.csv"]);
        s.threshold = f64::NAN;
        assert!(matches!(s.validate(), Err(DwellError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_quote_delimiter() {
        let s = parse(&["--delimiter", "\"", "a.csv"]);
        assert!(matches!(s.validate(), Err(DwellError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_identical_columns() {
        let s = parse(&["--value-column", "Time", "--timestamp-column", "time", "a.csv"]);
        assert!(matches!(s.validate(), Err(DwellError::Config(_))));
    }
}
