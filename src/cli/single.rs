//! `process_single_image <input_path> <output_path>`

use super::args::{MatteArgs, NormalizeArgs};
use super::config::CliConfigBuilder;
use super::parse_or_exit;
use crate::matte::create_provider;
use crate::pipeline::NormalizationPipeline;
use crate::single::process_single;
use crate::tracing_config::init_cli_tracing;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Remove the background from one image and normalize it
#[derive(Parser, Debug)]
#[command(name = "process_single_image", author, version, about, long_about = None)]
pub struct SingleCli {
    /// Source image (any supported format, detected from content)
    #[arg(value_name = "INPUT_PATH")]
    pub input_path: PathBuf,

    /// Destination PNG; parent directories are created
    #[arg(value_name = "OUTPUT_PATH")]
    pub output_path: PathBuf,

    #[command(flatten)]
    pub normalize: NormalizeArgs,

    #[command(flatten)]
    pub matte: MatteArgs,

    /// Remote matte request timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub timeout: u64,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub async fn main() -> Result<()> {
    let cli: SingleCli = parse_or_exit();
    init_cli_tracing(cli.verbose).context("Failed to initialize tracing")?;

    info!("Input: {}", cli.input_path.display());
    info!("Output: {}", cli.output_path.display());

    if !cli.input_path.is_file() {
        anyhow::bail!("Input file not found: {}", cli.input_path.display());
    }

    let config = CliConfigBuilder::normalization(&cli.normalize)?;
    let settings =
        CliConfigBuilder::matte_settings(&cli.matte, Duration::from_secs(cli.timeout));
    let matte = create_provider(&settings)
        .context("Failed to initialize background removal backend")?;
    let mut pipeline = NormalizationPipeline::new(config, matte);

    match process_single(&mut pipeline, &cli.input_path, &cli.output_path).await {
        Ok(saved) => {
            info!(
                "Saved {} ({} bytes)",
                saved.path.display(),
                saved.bytes_written
            );
            Ok(())
        },
        Err(e) => {
            error!(stage = %e.stage, "Error processing image: {}", e.source);
            Err(anyhow::Error::new(e).context(format!(
                "Failed to process {}",
                cli.input_path.display()
            )))
        },
    }
}
