//! Single-file driver: normalize one local image
//!
//! Usage: `process_single_image <input_path> <output_path>`

#[cfg(feature = "cli")]
use bgnorm::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::single::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
