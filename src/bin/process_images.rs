//! Batch driver: normalize every image listed in a CSV
//!
//! Usage: `process_images <csv_path> <output_dir>`

#[cfg(feature = "cli")]
use bgnorm::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::batch::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
