//! `process_images <csv_path> <output_dir>`

use super::args::{MatteArgs, NormalizeArgs};
use super::config::CliConfigBuilder;
use super::parse_or_exit;
use crate::batch::{BatchProcessor, CsvManifest};
use crate::config::FetchConfig;
use crate::matte::create_provider;
use crate::pipeline::NormalizationPipeline;
use crate::services::HttpFetcher;
use crate::tracing_config::init_cli_tracing;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Remove backgrounds and normalize every image listed in a CSV
///
/// Each data row with an image_url is written to
/// OUTPUT_DIR/processed_<row>.png. Rows that fail are logged and skipped;
/// the exit code is 0 once the whole file has been walked.
#[derive(Parser, Debug)]
#[command(name = "process_images", author, version, about, long_about)]
pub struct BatchCli {
    /// CSV file with a header row containing an image_url column
    #[arg(value_name = "CSV_PATH")]
    pub csv_path: PathBuf,

    /// Directory for processed_<row>.png outputs (created if missing)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub normalize: NormalizeArgs,

    #[command(flatten)]
    pub matte: MatteArgs,

    /// Per-download timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub timeout: u64,

    /// Write a JSON report of every row to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub async fn main() -> Result<()> {
    let cli: BatchCli = parse_or_exit();
    init_cli_tracing(cli.verbose).context("Failed to initialize tracing")?;

    info!("CSV path: {}", cli.csv_path.display());
    info!("Output directory: {}", cli.output_dir.display());

    if !cli.csv_path.exists() {
        anyhow::bail!("CSV file not found: {}", cli.csv_path.display());
    }

    // Manifest problems are fatal and must be reported before anything is created
    let manifest = CsvManifest::from_path(&cli.csv_path)
        .with_context(|| format!("Fatal error processing CSV {}", cli.csv_path.display()))?;
    info!(headers = ?manifest.headers(), "CSV has {} data rows", manifest.len());

    let config = CliConfigBuilder::normalization(&cli.normalize)?;
    let timeout = Duration::from_secs(cli.timeout);
    let fetch_config = FetchConfig {
        timeout,
        ..FetchConfig::default()
    };

    let matte = create_provider(&CliConfigBuilder::matte_settings(&cli.matte, timeout))
        .context("Failed to initialize background removal backend")?;
    let pipeline = NormalizationPipeline::new(config, matte);
    let settings = pipeline.config();
    info!(
        backend = pipeline.matte_name(),
        margin_percent = settings.margin_percent,
        target_ratio = settings.target_ratio,
        background = %settings.background_color,
        "Pipeline ready"
    );

    let fetcher = HttpFetcher::new(&fetch_config).context("Failed to create HTTP client")?;
    let mut processor = BatchProcessor::new(pipeline, fetcher);

    let start = Instant::now();
    let report = processor
        .run(&manifest, &cli.output_dir)
        .await
        .context("Fatal error processing CSV")?;

    info!(
        "Processed {} of {} rows ({} skipped, {} failed) in {:.2}s",
        report.processed,
        report.rows,
        report.skipped,
        report.failed,
        start.elapsed().as_secs_f64()
    );

    if let Some(path) = &cli.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    info!("Processing completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        BatchCli::command().debug_assert();
    }

    #[test]
    fn test_positional_arguments_are_required() {
        assert!(BatchCli::try_parse_from(["process_images", "rows.csv"]).is_err());
        assert!(BatchCli::try_parse_from(["process_images", "a.csv", "out", "extra"]).is_err());

        let cli = BatchCli::try_parse_from([
            "process_images",
            "rows.csv",
            "out",
            "--matte",
            "passthrough",
            "--target-ratio",
            "4:3",
        ])
        .unwrap();
        assert_eq!(cli.csv_path, PathBuf::from("rows.csv"));
        assert_eq!(cli.timeout, 30);
        assert_eq!(cli.normalize.target_ratio, Some(4.0 / 3.0));
    }
}
