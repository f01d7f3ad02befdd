//! Main analysis pipeline for tempdwell.
//!
//! Orchestrates input discovery, parsing, merging and aggregation, returning
//! an [`AnalysisReport`] ready for the report writer.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tempdwell_core::error::Result;
use tempdwell_core::models::{AnalysisResult, PeriodSummary, ThresholdMode};
use tempdwell_core::settings::Settings;
use tracing::{info, warn};

use crate::aggregator::IntervalAggregator;
use crate::reader::{load_documents, merge_documents, resolve_input_paths, ColumnSpec, Document};

// ── Public types ──────────────────────────────────────────────────────────────

/// Parameters of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub columns: ColumnSpec,
    pub threshold: f64,
    pub mode: ThresholdMode,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            columns: ColumnSpec::default(),
            threshold: 0.0,
            mode: ThresholdMode::Strict,
        }
    }
}

impl From<&Settings> for AnalysisOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            columns: ColumnSpec {
                value: settings.value_column.clone(),
                timestamp: settings.timestamp_column.clone(),
                delimiter: settings.delimiter,
            },
            threshold: settings.threshold,
            mode: settings.threshold_mode(),
        }
    }
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Documents merged.
    pub documents: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub duplicates_replaced: usize,
    /// Distinct samples after merging.
    pub samples: usize,
    pub first_sample: Option<DateTime<Utc>>,
    pub last_sample: Option<DateTime<Utc>>,
    pub intervals_skipped: usize,
    /// Wall-clock seconds spent reading files (zero for in-memory input).
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent parsing, merging and aggregating.
    pub aggregate_time_seconds: f64,
}

/// The complete output of the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub summary: PeriodSummary,
    pub metadata: AnalysisMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the pipeline over in-memory documents.
///
/// 1. Merge `documents` into one ordered sample series.
/// 2. Aggregate the series into overall and daily statistics.
/// 3. Summarise the below-threshold time across days.
pub fn analyze_documents(documents: &[Document], options: &AnalysisOptions) -> Result<AnalysisReport> {
    let start = Instant::now();

    // ── Step 1: Merge ─────────────────────────────────────────────────────────
    let (series, stats) = merge_documents(documents, &options.columns)?;
    if series.is_empty() {
        warn!("No valid samples found in {} documents", documents.len());
    }

    // ── Step 2: Aggregate ─────────────────────────────────────────────────────
    let aggregator = IntervalAggregator::with_mode(options.threshold, options.mode);
    let result = aggregator.aggregate(series.as_slice());

    // ── Step 3: Summarise ─────────────────────────────────────────────────────
    let summary = IntervalAggregator::summarize(&result);

    info!(
        "Analysed {} samples from {} documents into {} days",
        series.len(),
        stats.documents,
        result.daily_stats.len()
    );

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        documents: stats.documents,
        rows_read: stats.rows_read,
        rows_skipped: stats.rows_skipped,
        duplicates_replaced: stats.duplicates_replaced,
        samples: series.len(),
        first_sample: series.first().map(|s| s.timestamp),
        last_sample: series.last().map(|s| s.timestamp),
        intervals_skipped: result.intervals_skipped,
        load_time_seconds: 0.0,
        aggregate_time_seconds: start.elapsed().as_secs_f64(),
    };

    Ok(AnalysisReport {
        result,
        summary,
        metadata,
    })
}

/// Run the pipeline over files and directories given on the command line.
pub fn analyze_paths(paths: &[PathBuf], options: &AnalysisOptions) -> Result<AnalysisReport> {
    let load_start = Instant::now();
    let files = resolve_input_paths(paths)?;
    info!("Reading {} input files", files.len());
    let documents = load_documents(&files)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let mut report = analyze_documents(&documents, options)?;
    report.metadata.load_time_seconds = load_time;
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
