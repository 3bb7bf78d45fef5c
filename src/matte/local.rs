//! In-process segmentation through Tract (pure Rust ONNX inference)

use super::{apply_mask, MatteProvider, ModelKind};
use crate::error::{NormalizeError, Result};
use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage, GenericImageView, GrayImage, RgbImage};
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;

type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Salient-object segmentation model loaded from an ONNX file
pub struct LocalModelMatte {
    model: TractModel,
    kind: ModelKind,
}

impl std::fmt::Debug for LocalModelMatte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalModelMatte")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl LocalModelMatte {
    /// Load and optimize the model at `path`
    ///
    /// # Errors
    /// - File missing or unreadable
    /// - ONNX graph cannot be loaded, typed or optimized
    pub fn from_path(path: &Path, kind: ModelKind) -> Result<Self> {
        if !path.exists() {
            return Err(NormalizeError::matte(format!(
                "Model file not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read(path)
            .map_err(|e| NormalizeError::file_io_error("read model file", path, &e))?;
        let model = Self::from_bytes(&data, kind)?;
        tracing::info!(model = %path.display(), kind = ?kind, "model loaded");
        Ok(model)
    }

    /// Load and optimize a model from ONNX bytes
    ///
    /// # Errors
    /// - ONNX graph cannot be loaded, typed or optimized
    pub fn from_bytes(data: &[u8], kind: ModelKind) -> Result<Self> {
        let start = Instant::now();
        let size = kind.input_size();

        let model = onnx()
            .model_for_read(&mut std::io::Cursor::new(data))
            .map_err(|e| NormalizeError::matte(format!("Failed to load ONNX model: {e}")))?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())
            .map_err(|e| NormalizeError::matte(format!("Failed to set model input shape: {e}")))?
            .into_optimized()
            .map_err(|e| NormalizeError::matte(format!("Failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| {
                NormalizeError::matte(format!("Failed to create runnable model: {e}"))
            })?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            input_size = size,
            "tract model ready"
        );
        Ok(Self { model, kind })
    }

    /// Predict a foreground mask at the source resolution
    fn predict_mask(&self, image: &DynamicImage) -> Result<GrayImage> {
        let (width, height) = image.dimensions();
        let input = preprocess(&image.to_rgb8(), self.kind);

        let start = Instant::now();
        let outputs = self
            .model
            .run(tvec![input.into()])
            .map_err(|e| NormalizeError::matte(format!("Tract inference failed: {e}")))?;
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "inference finished"
        );

        let output = outputs
            .first()
            .ok_or_else(|| NormalizeError::matte("Model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| NormalizeError::matte(format!("Unexpected output tensor: {e}")))?;

        let shape = view.shape();
        let (mask_height, mask_width) = match shape {
            [.., h, w] => (*h, *w),
            _ => {
                return Err(NormalizeError::matte(format!(
                    "Expected at least 2D output, got shape {:?}",
                    shape
                )))
            },
        };

        let values: Vec<f32> = view.iter().take(mask_height * mask_width).copied().collect();
        let mask = mask_from_prediction(&values, mask_width as u32, mask_height as u32)?;

        Ok(image::imageops::resize(
            &mask,
            width,
            height,
            FilterType::Lanczos3,
        ))
    }
}

#[async_trait]
impl MatteProvider for LocalModelMatte {
    async fn apply(&mut self, image: DynamicImage) -> Result<DynamicImage> {
        let mask = self.predict_mask(&image)?;
        Ok(DynamicImage::ImageRgba8(apply_mask(&image, &mask)?))
    }

    fn name(&self) -> &str {
        match self.kind {
            ModelKind::U2net => "u2net",
            ModelKind::Isnet => "isnet",
        }
    }
}

/// Stretch-resize to the model input, scale by the brightest channel value,
/// then apply the preset mean/std, as an NCHW tensor
fn preprocess(rgb: &RgbImage, kind: ModelKind) -> Tensor {
    let size = kind.input_size();
    let resized = image::imageops::resize(rgb, size as u32, size as u32, FilterType::Lanczos3);

    let max = resized.as_raw().iter().copied().max().unwrap_or(0);
    let scale = if max == 0 { 1.0 } else { f32::from(max) };
    let (mean, std) = (kind.mean(), kind.std());

    let array = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
        let pixel = resized.get_pixel(x as u32, y as u32).0;
        let (value, m, s) = match c {
            0 => (pixel[0], mean[0], std[0]),
            1 => (pixel[1], mean[1], std[1]),
            _ => (pixel[2], mean[2], std[2]),
        };
        (f32::from(value) / scale - m) / s
    });

    array.into()
}

/// Min-max normalize raw model output into an 8-bit mask
fn mask_from_prediction(values: &[f32], width: u32, height: u32) -> Result<GrayImage> {
    let expected = width as usize * height as usize;
    if values.len() != expected || expected == 0 {
        return Err(NormalizeError::matte(format!(
            "Model output has {} values, expected {}x{}",
            values.len(),
            width,
            height
        )));
    }

    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    let pixels = values
        .iter()
        .map(|&v| {
            let normalized = if range > f32::EPSILON { (v - min) / range } else { 0.0 };
            (normalized.clamp(0.0, 1.0) * 255.0) as u8
        })
        .collect();

    GrayImage::from_raw(width, height, pixels)
        .ok_or_else(|| NormalizeError::internal("mask buffer size mismatch"))
}
