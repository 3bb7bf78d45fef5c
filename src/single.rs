//! Single-file driver

use crate::pipeline::{
    NormalizationPipeline, ProcessingStage, SavedImage, StageContext, StageError,
};
use crate::services::ImageIOService;
use crate::tracing_config::spans;
use std::path::Path;
use tracing::{info, Instrument};

/// Normalize `input` into `output`, creating parent directories of `output`
///
/// Output is written only after every earlier stage succeeded.
///
/// # Errors
/// - A [`StageError`] naming the first stage that failed; a missing input is
///   reported at [`ProcessingStage::Fetch`]
pub async fn process_single(
    pipeline: &mut NormalizationPipeline,
    input: &Path,
    output: &Path,
) -> Result<SavedImage, StageError> {
    async move {
        info!("Reading {}", input.display());
        let bytes = ImageIOService::read_file(input).at_stage(ProcessingStage::Fetch)?;
        let saved = pipeline.process_bytes(&bytes, output).await?;
        info!(
            width = saved.geometry.canvas.final_width,
            height = saved.geometry.canvas.final_height,
            "Successfully processed and saved: {}",
            saved.path.display()
        );
        Ok(saved)
    }
    .instrument(spans::single(input, output))
    .await
}
