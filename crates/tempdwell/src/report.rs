//! Rendering of an [`AnalysisReport`] as CSV, JSON or plain text.

use std::io::Write;
use std::str::FromStr;

use tempdwell_core::error::{DwellError, Result};
use tempdwell_core::formatting::{format_duration, format_number, percent_of_day};
use tempdwell_core::models::ThresholdMode;
use tempdwell_core::time_utils::ms_to_minutes;
use tempdwell_data::analysis::AnalysisReport;

/// Output layout selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
    Text,
}

impl FromStr for ReportFormat {
    type Err = DwellError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(DwellError::Config(format!("unknown report format \"{}\"", other))),
        }
    }
}

/// One `Metric,Date,Value` line of the CSV report.
#[derive(Debug, Clone, PartialEq)]
struct ReportRow {
    metric: String,
    date: String,
    value: String,
}

impl ReportRow {
    fn new(metric: impl Into<String>, date: impl Into<String>, value: String) -> Self {
        Self {
            metric: metric.into(),
            date: date.into(),
            value,
        }
    }
}

/// Write `report` to `writer` in the requested format.
pub fn write_report<W: Write>(mut writer: W, report: &AnalysisReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            csv_writer.write_record(["Metric", "Date", "Value"])?;
            for row in report_rows(report) {
                csv_writer.write_record([&row.metric, &row.date, &row.value])?;
            }
            csv_writer.flush()?;
        }
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, report)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        ReportFormat::Text => {
            write_text(&mut writer, report)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Threshold as it appears in metric names, e.g. `"0"` or `"-2.5"`.
fn threshold_label(threshold: f64) -> String {
    format!("{}", threshold)
}

/// Build the rows of the CSV report.
fn report_rows(report: &AnalysisReport) -> Vec<ReportRow> {
    let result = &report.result;
    let t = threshold_label(result.threshold);
    let below = match result.threshold_mode {
        ThresholdMode::Strict => format!("Time Below {}", t),
        ThresholdMode::Inclusive => format!("Time At Or Below {}", t),
    };
    let above = match result.threshold_mode {
        ThresholdMode::Strict => format!("Time At Or Above {}", t),
        ThresholdMode::Inclusive => format!("Time Above {}", t),
    };

    let mut rows = vec![ReportRow::new(
        "Overall Average",
        "",
        format!("{:.2}", result.overall_average),
    )];

    for (date, day) in &result.daily_stats {
        let below_ms = day.time_below_threshold_ms;
        let above_ms = day.time_at_or_above_threshold_ms();
        rows.push(ReportRow::new("Daily Average", date.as_str(), format!("{:.2}", day.average_value())));
        rows.push(ReportRow::new(
            format!("{} (min)", below),
            date.as_str(),
            format!("{:.1}", ms_to_minutes(below_ms as f64)),
        ));
        rows.push(ReportRow::new(
            format!("{} (%)", below),
            date.as_str(),
            format!("{:.2}", percent_of_day(below_ms, 2)),
        ));
        rows.push(ReportRow::new(
            format!("{} (min)", above),
            date.as_str(),
            format!("{:.1}", ms_to_minutes(above_ms as f64)),
        ));
        rows.push(ReportRow::new(
            format!("{} (%)", above),
            date.as_str(),
            format!("{:.2}", percent_of_day(above_ms, 2)),
        ));
    }

    let summary = &report.summary;
    rows.push(ReportRow::new(
        format!("Average Daily {} (min)", below),
        "",
        format!("{:.1}", ms_to_minutes(summary.average_daily_below_ms)),
    ));
    rows.push(ReportRow::new(
        format!("Maximum Daily {} (min)", below),
        summary.max_below_day.clone().unwrap_or_default(),
        format!("{:.1}", ms_to_minutes(summary.max_daily_below_ms as f64)),
    ));

    rows
}

/// Human-readable table for terminal output.
fn write_text<W: Write>(out: &mut W, report: &AnalysisReport) -> Result<()> {
    let result = &report.result;
    let summary = &report.summary;
    let t = threshold_label(result.threshold);
    let relation = match result.threshold_mode {
        ThresholdMode::Strict => "<",
        ThresholdMode::Inclusive => "<=",
    };

    writeln!(out, "Overall average: {}", format_number(result.overall_average, 2))?;
    writeln!(out, "Below threshold: value {} {}", relation, t)?;
    writeln!(
        out,
        "Samples: {} from {} documents ({} rows skipped)",
        report.metadata.samples, report.metadata.documents, report.metadata.rows_skipped
    )?;
    writeln!(out)?;

    if result.daily_stats.is_empty() {
        writeln!(out, "No intervals to report.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<10}  {:>9}  {:>8}  {:>7}  {:>8}  {:>7}",
        "Date", "Average", "Below", "Below%", "Above", "Above%"
    )?;
    for (date, day) in &result.daily_stats {
        let above_ms = day.time_at_or_above_threshold_ms();
        writeln!(
            out,
            "{:<10}  {:>9}  {:>8}  {:>7.2}  {:>8}  {:>7.2}",
            date,
            format_number(day.average_value(), 2),
            format_duration(day.time_below_threshold_ms),
            percent_of_day(day.time_below_threshold_ms, 2),
            format_duration(above_ms),
            percent_of_day(above_ms, 2),
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Average daily time below {}: {}",
        t,
        format_duration(summary.average_daily_below_ms.round() as i64)
    )?;
    match &summary.max_below_day {
        Some(day) => writeln!(
            out,
            "Maximum daily time below {}: {} ({})",
            t,
            format_duration(summary.max_daily_below_ms),
            day
        )?,
        None => writeln!(out, "Maximum daily time below {}: 0m", t)?,
    }

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
