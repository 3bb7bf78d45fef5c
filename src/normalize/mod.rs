//! Normalization core: content box, margin and aspect-ratio fit, flatten
//!
//! Everything here is synchronous and pure. The drivers call [`normalize`]
//! once per image after the matte has been applied.

pub mod bbox;
pub mod compose;
pub mod fit;

pub use bbox::{extract_bbox, BoundingBox};
pub use compose::{compose, flatten, place_on_canvas};
pub use fit::{fit, CanvasFit};

use crate::config::NormalizationConfig;
use crate::error::Result;
use image::{DynamicImage, GenericImageView, RgbImage};
use serde::Serialize;

/// Output of [`normalize`] with the intermediate geometry
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Opaque RGB result
    pub image: RgbImage,
    pub geometry: Geometry,
}

/// Geometry decisions made while normalizing one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub source_width: u32,
    pub source_height: u32,
    pub bbox: BoundingBox,
    pub canvas: CanvasFit,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Recenter matted content with margin, fit the aspect ratio and flatten
///
/// # Errors
/// - Degenerate geometry (zero-sized input)
/// - Invalid `config` values
///
/// # Examples
///
/// ```rust
/// use bgnorm::{normalize, NormalizationConfig};
/// use image::{DynamicImage, Rgba, RgbaImage};
///
/// let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 50, Rgba([0, 0, 0, 255])));
/// let result = normalize(&image, &NormalizationConfig::default()).unwrap();
/// assert_eq!(result.image.dimensions(), (112, 112));
/// ```
pub fn normalize(image: &DynamicImage, config: &NormalizationConfig) -> Result<NormalizedImage> {
    config.validate()?;

    let (source_width, source_height) = image.dimensions();
    let bbox = extract_bbox(image);
    let canvas = fit(
        bbox.width(),
        bbox.height(),
        config.margin_percent,
        config.target_ratio,
    )?;

    let (placed, (offset_x, offset_y)) = place_on_canvas(image, bbox, &canvas)?;
    let flattened = flatten(&placed, config.background_color);

    tracing::debug!(
        bbox = %bbox,
        margin_px = canvas.margin_px,
        width = canvas.final_width,
        height = canvas.final_height,
        offset_x,
        offset_y,
        "normalized"
    );

    Ok(NormalizedImage {
        image: flattened,
        geometry: Geometry {
            source_width,
            source_height,
            bbox,
            canvas,
            offset_x,
            offset_y,
        },
    })
}
