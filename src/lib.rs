#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # bgnorm
//!
//! Background removal and canvas normalization for product photos.
//!
//! Each source image goes through the same five stages: obtain bytes,
//! decode, remove the background with a [`MatteProvider`], normalize, and
//! save as PNG. Normalization crops to the non-transparent content, adds a
//! margin proportional to the larger content side, grows the shorter side
//! until the canvas matches a target aspect ratio, centers the content and
//! flattens it onto an opaque background color.
//!
//! Two drivers share that pipeline:
//!
//! - [`batch`]: one image per row of a CSV with an `image_url` column,
//!   written to `processed_<row>.png`, continuing past per-row failures
//! - [`single`]: one local file to an explicit output path
//!
//! ## Quick Start
//!
//! ```rust
//! use bgnorm::{normalize, NormalizationConfig};
//! use image::{DynamicImage, Rgba, RgbaImage};
//!
//! // A cut-out with a 40x20 opaque subject
//! let mut cutout = RgbaImage::new(200, 100);
//! for y in 10..30 {
//!     for x in 50..90 {
//!         cutout.put_pixel(x, y, Rgba([30, 60, 90, 255]));
//!     }
//! }
//!
//! let result = normalize(&DynamicImage::ImageRgba8(cutout), &NormalizationConfig::default())?;
//! // margin floor(40 * 6%) = 2 -> 44x24 -> 44x44
//! assert_eq!(result.image.dimensions(), (44, 44));
//! # Ok::<(), bgnorm::NormalizeError>(())
//! ```
//!
//! ## Running a batch
//!
//! ```rust,no_run
//! use bgnorm::{
//!     batch::{process_csv, BatchProcessor},
//!     matte::{create_provider, MatteBackend, MatteSettings},
//!     FetchConfig, HttpFetcher, NormalizationConfig, NormalizationPipeline,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let matte = create_provider(&MatteSettings::new(MatteBackend::Local))?;
//! let pipeline = NormalizationPipeline::new(NormalizationConfig::default(), matte);
//! let mut processor = BatchProcessor::new(pipeline, HttpFetcher::new(&FetchConfig::default())?);
//!
//! let report = process_csv(Path::new("products.csv"), Path::new("out"), &mut processor).await?;
//! println!("{} processed, {} failed", report.processed, report.failed);
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `tract` (default): local segmentation model through the pure Rust Tract runtime
//! - `cli` (default): `process_images` and `process_single_image` binaries
//! - `webp-support` (default): WebP input decoding
//! - `tracing-json`: JSON log output for the binaries

pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod matte;
pub mod normalize;
pub mod pipeline;
pub mod services;
pub mod single;
pub mod tracing_config;

pub use batch::{BatchProcessor, BatchReport, CsvManifest, RowOutcome, RowStatus};
pub use config::{BackgroundColor, FetchConfig, NormalizationConfig, NormalizationConfigBuilder};
pub use error::{NormalizeError, Result};
pub use matte::{create_provider, MatteBackend, MatteProvider, MatteSettings, ModelKind};
pub use normalize::{extract_bbox, fit, normalize, BoundingBox, CanvasFit, NormalizedImage};
pub use pipeline::{NormalizationPipeline, ProcessingStage, SavedImage, StageError};
pub use services::{HttpFetcher, ImageFetcher, ImageIOService};
pub use single::process_single;
pub use tracing_config::{TracingConfig, TracingFormat};
