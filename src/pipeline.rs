//! Per-item stage orchestration shared by both drivers
//!
//! obtain bytes → decode → matte → normalize → save, with every failure
//! tagged by the stage it happened in.

use crate::config::NormalizationConfig;
use crate::error::NormalizeError;
use crate::matte::MatteProvider;
use crate::normalize::{normalize, Geometry, NormalizedImage};
use crate::services::ImageIOService;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Stages of processing a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStage {
    /// Downloading or reading the source bytes
    Fetch,
    /// Decoding bytes into pixels
    Decode,
    /// Background removal
    Matte,
    /// Crop, margin, aspect fit and flatten
    Normalize,
    /// PNG encode and write
    Save,
}

impl ProcessingStage {
    /// Human-readable progress line for this stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::Fetch => "Obtaining image",
            ProcessingStage::Decode => "Opening image",
            ProcessingStage::Matte => "Removing background",
            ProcessingStage::Normalize => {
                "Centering image, adding margin and adjusting aspect ratio"
            },
            ProcessingStage::Save => "Saving result",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStage::Fetch => "fetch",
            ProcessingStage::Decode => "decode",
            ProcessingStage::Matte => "matte",
            ProcessingStage::Normalize => "normalize",
            ProcessingStage::Save => "save",
        }
    }
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure together with the stage that produced it
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: ProcessingStage,
    #[source]
    pub source: NormalizeError,
}

impl StageError {
    #[must_use]
    pub fn new(stage: ProcessingStage, source: NormalizeError) -> Self {
        Self { stage, source }
    }
}

/// Extension for tagging library results with a stage
pub trait StageContext<T> {
    /// # Errors
    /// - Wraps the original error in a [`StageError`]
    fn at_stage(self, stage: ProcessingStage) -> Result<T, StageError>;
}

impl<T> StageContext<T> for crate::error::Result<T> {
    fn at_stage(self, stage: ProcessingStage) -> Result<T, StageError> {
        self.map_err(|source| StageError::new(stage, source))
    }
}

/// Result of a successfully saved item
#[derive(Debug, Clone, Serialize)]
pub struct SavedImage {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub geometry: Geometry,
    pub elapsed_ms: u64,
}

/// Runs matte and normalization with one configuration over many items
pub struct NormalizationPipeline {
    config: NormalizationConfig,
    matte: Box<dyn MatteProvider>,
}

impl std::fmt::Debug for NormalizationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizationPipeline")
            .field("config", &self.config)
            .field("matte", &self.matte.name())
            .finish()
    }
}

impl NormalizationPipeline {
    #[must_use]
    pub fn new(config: NormalizationConfig, matte: Box<dyn MatteProvider>) -> Self {
        Self { config, matte }
    }

    #[must_use]
    pub fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    #[must_use]
    pub fn matte_name(&self) -> &str {
        self.matte.name()
    }

    /// Decode source bytes
    ///
    /// # Errors
    /// - [`ProcessingStage::Decode`] on unknown or corrupt data
    pub fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, StageError> {
        info!("{}...", ProcessingStage::Decode.description());
        let image = ImageIOService::decode_bytes(bytes).at_stage(ProcessingStage::Decode)?;
        let (width, height) = image.dimensions();
        debug!(width, height, color = ?image.color(), "decoded");
        Ok(image)
    }

    /// Remove the background and normalize a decoded image
    ///
    /// # Errors
    /// - [`ProcessingStage::Matte`] when the provider fails
    /// - [`ProcessingStage::Normalize`] on degenerate geometry
    pub async fn process_image(
        &mut self,
        image: DynamicImage,
    ) -> Result<NormalizedImage, StageError> {
        info!(
            backend = self.matte.name(),
            "{}...",
            ProcessingStage::Matte.description()
        );
        let matted = self
            .matte
            .apply(image)
            .await
            .at_stage(ProcessingStage::Matte)?;

        info!("{}...", ProcessingStage::Normalize.description());
        normalize(&matted, &self.config).at_stage(ProcessingStage::Normalize)
    }

    /// Encode and write a normalized image
    ///
    /// # Errors
    /// - [`ProcessingStage::Save`] on encode or write failure
    pub fn save(&self, normalized: NormalizedImage, path: &Path) -> Result<u64, StageError> {
        info!(path = %path.display(), "{}...", ProcessingStage::Save.description());
        ImageIOService::save_png(&DynamicImage::ImageRgb8(normalized.image), path)
            .at_stage(ProcessingStage::Save)
    }

    /// Decode → matte → normalize → save for one item
    ///
    /// # Errors
    /// - A [`StageError`] naming the first stage that failed
    pub async fn process_bytes(
        &mut self,
        bytes: &[u8],
        output: &Path,
    ) -> Result<SavedImage, StageError> {
        let start = Instant::now();
        let image = self.decode(bytes)?;
        let normalized = self.process_image(image).await?;
        let geometry = normalized.geometry;
        let bytes_written = self.save(normalized, output)?;

        Ok(SavedImage {
            path: output.to_path_buf(),
            bytes_written,
            geometry,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}
