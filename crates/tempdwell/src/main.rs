mod bootstrap;
mod report;

use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use tempdwell_core::settings::Settings;
use tempdwell_data::analysis::{analyze_paths, AnalysisOptions};

use crate::report::{write_report, ReportFormat};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;
    settings.validate()?;

    tracing::info!("tempdwell v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Threshold: {} ({:?}), inputs: {}",
        settings.threshold,
        settings.threshold_mode(),
        settings.paths.len()
    );

    let format: ReportFormat = settings.format.parse()?;
    let options = AnalysisOptions::from(&settings);
    let report = analyze_paths(&settings.paths, &options)?;

    tracing::debug!(
        "{} rows read, {} skipped, {} duplicates replaced, {} intervals skipped",
        report.metadata.rows_read,
        report.metadata.rows_skipped,
        report.metadata.duplicates_replaced,
        report.metadata.intervals_skipped
    );

    match &settings.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_report(BufWriter::new(file), &report, format)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_report(stdout.lock(), &report, format)?;
        }
    }

    Ok(())
}
