//! Input discovery, loading and parsing for tempdwell.
//!
//! Turns one or more delimited text exports into a single deduplicated,
//! time-ordered [`SampleSeries`]. Columns are located by header name, so
//! column order in the files does not matter.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use serde::Serialize;
use tempdwell_core::error::{DwellError, Result};
use tempdwell_core::models::{Sample, SampleSeries};
use tempdwell_core::time_utils::parse_utc_timestamp;
use tracing::{debug, warn};

// ── Column configuration ──────────────────────────────────────────────────────

/// Names of the required columns and the field delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Header of the numeric reading column.
    pub value: String,
    /// Header of the UTC timestamp column.
    pub timestamp: String,
    pub delimiter: char,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            value: "state".to_string(),
            timestamp: "last_changed".to_string(),
            delimiter: ',',
        }
    }
}

/// Positions of the required columns, resolved once from a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeaderIndex {
    value: usize,
    timestamp: usize,
}

impl HeaderIndex {
    /// Locate the required columns in `headers`, ignoring case.
    fn resolve(headers: &StringRecord, columns: &ColumnSpec, document: &str) -> Result<Self> {
        let names: Vec<String> = headers
            .iter()
            .map(|name| name.trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();
        let find = |wanted: &str| {
            let wanted_lower = wanted.trim().to_lowercase();
            names
                .iter()
                .position(|name| *name == wanted_lower)
                .ok_or_else(|| DwellError::MalformedInput {
                    document: document.to_string(),
                    column: wanted.to_string(),
                })
        };

        Ok(Self {
            value: find(&columns.value)?,
            timestamp: find(&columns.timestamp)?,
        })
    }
}

// ── Documents ─────────────────────────────────────────────────────────────────

/// One raw text export together with a name used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub content: String,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a document from disk as UTF-8.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DwellError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), content))
    }
}

// ── Merging ───────────────────────────────────────────────────────────────────

/// Row counters gathered while merging documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Documents merged successfully.
    pub documents: usize,
    /// Data rows seen (header excluded).
    pub rows_read: usize,
    /// Data rows dropped for a missing or unparseable field.
    pub rows_skipped: usize,
    /// Accepted rows whose timestamp replaced an earlier sample.
    pub duplicates_replaced: usize,
}

/// Accumulates samples from successive documents, keyed by millisecond
/// timestamp. A later sample with the same timestamp replaces the earlier one.
#[derive(Debug, Default)]
pub struct SampleMerger {
    columns: ColumnSpec,
    samples: HashMap<i64, Sample>,
    stats: MergeStats,
}

impl SampleMerger {
    pub fn new(columns: ColumnSpec) -> Self {
        Self {
            columns,
            samples: HashMap::new(),
            stats: MergeStats::default(),
        }
    }

    /// Parse one document and merge its rows.
    ///
    /// Returns the number of rows accepted. Fails with
    /// [`DwellError::MalformedInput`] when the header lacks a required column,
    /// in which case nothing from the document is merged, and with
    /// [`DwellError::Config`] when the delimiter is not a single ASCII byte.
    pub fn add_document(&mut self, name: &str, content: &str) -> Result<usize> {
        let delimiter = u8::try_from(self.columns.delimiter)
            .ok()
            .filter(|b| b.is_ascii())
            .ok_or_else(|| {
                DwellError::Config(format!("unsupported delimiter {:?}", self.columns.delimiter))
            })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        if is_blank(&headers) {
            debug!("Document {} is empty", name);
            self.stats.documents += 1;
            return Ok(0);
        }
        let index = HeaderIndex::resolve(&headers, &self.columns, name)?;

        let mut rows_read = 0usize;
        let mut accepted = 0usize;
        let mut skipped = 0usize;
        for record in reader.records() {
            let record = match record {
                Ok(record) if is_blank(&record) => continue,
                Ok(record) => record,
                Err(e) => {
                    debug!("Skipping unreadable row in {}: {}", name, e);
                    rows_read += 1;
                    skipped += 1;
                    continue;
                }
            };
            rows_read += 1;
            match parse_record(&record, index) {
                Some(sample) => {
                    if self.samples.insert(sample.key(), sample).is_some() {
                        self.stats.duplicates_replaced += 1;
                    }
                    accepted += 1;
                }
                None => skipped += 1,
            }
        }

        self.stats.rows_read += rows_read;
        self.stats.rows_skipped += skipped;
        self.stats.documents += 1;
        debug!(
            "Document {}: {} rows accepted, {} skipped",
            name, accepted, skipped
        );

        Ok(accepted)
    }

    /// Sort the merged samples into a [`SampleSeries`].
    pub fn finish(self) -> (SampleSeries, MergeStats) {
        (SampleSeries::from_samples(self.samples.into_values()), self.stats)
    }
}

/// Merge `documents` in order into one [`SampleSeries`].
///
/// Stops at the first structurally malformed document.
pub fn merge_documents(
    documents: &[Document],
    columns: &ColumnSpec,
) -> Result<(SampleSeries, MergeStats)> {
    let mut merger = SampleMerger::new(columns.clone());
    for doc in documents {
        if let Err(e) = merger.add_document(&doc.name, &doc.content) {
            warn!("Rejecting {}: {}", doc.name, e);
            return Err(e);
        }
    }
    Ok(merger.finish())
}

// ── File discovery ────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `dir`, sorted by path.
pub fn find_csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Expand command-line paths into the list of files to read.
///
/// Files are kept in the given order; directories contribute their `.csv`
/// files in path order.
pub fn resolve_input_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(DwellError::PathNotFound(path.clone()));
        }
        if path.is_dir() {
            let found = find_csv_files(path);
            if found.is_empty() {
                return Err(DwellError::NoInputFiles(path.clone()));
            }
            debug!("Found {} CSV files in {}", found.len(), path.display());
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Read every path in order.
pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    paths.iter().map(|path| Document::read(path)).collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Parse one data record, returning `None` when it should be skipped.
fn parse_record(record: &StringRecord, index: HeaderIndex) -> Option<Sample> {
    let raw_value = record.get(index.value).filter(|f| !f.is_empty())?;
    let raw_ts = record.get(index.timestamp).filter(|f| !f.is_empty())?;

    let value = match raw_value.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            debug!("Skipping row with non-numeric value \"{}\"", raw_value);
            return None;
        }
    };
    let timestamp = parse_utc_timestamp(raw_ts)?;

    Some(Sample::new(value, timestamp))
}

/// Whether every field of `record` is empty, e.g. a whitespace-only line.
fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
