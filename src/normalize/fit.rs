//! Margin and aspect-ratio fitting
//!
//! All arithmetic truncates toward zero, matching integer (floor) division
//! for the non-negative values involved.

use crate::error::{NormalizeError, Result};
use serde::Serialize;

/// Largest canvas accepted, in pixels (1 GiB as RGBA)
pub const MAX_CANVAS_PIXELS: u64 = 1 << 28;

/// Final canvas dimensions for a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanvasFit {
    pub final_width: u32,
    pub final_height: u32,
    /// Padding applied on every side before the aspect-ratio fit
    pub margin_px: u32,
}

impl CanvasFit {
    /// Top-left position that centers `content_width` x `content_height`
    ///
    /// Odd leftovers bias the content toward the top-left.
    #[must_use]
    pub fn offset_for(&self, content_width: u32, content_height: u32) -> (u32, u32) {
        (
            self.final_width.saturating_sub(content_width) / 2,
            self.final_height.saturating_sub(content_height) / 2,
        )
    }
}

/// Compute canvas size and margin for content of the given dimensions
///
/// The margin is `floor(max(w, h) * margin_percent / 100)` on each side. The
/// padded rectangle is then grown along its shorter dimension (never
/// shrunk) until `width / height` matches `target_ratio`.
///
/// # Errors
/// - `content_width` or `content_height` is zero
/// - `margin_percent` negative/non-finite or `target_ratio` not a positive finite number
/// - The resulting canvas does not fit in `u32` or exceeds [`MAX_CANVAS_PIXELS`]
///
/// # Examples
///
/// ```rust
/// use bgnorm::normalize::fit;
///
/// let canvas = fit(100, 50, 6.0, 1.0).unwrap();
/// assert_eq!(canvas.margin_px, 6);
/// assert_eq!((canvas.final_width, canvas.final_height), (112, 112));
/// ```
pub fn fit(
    content_width: u32,
    content_height: u32,
    margin_percent: f64,
    target_ratio: f64,
) -> Result<CanvasFit> {
    if content_width == 0 || content_height == 0 {
        return Err(NormalizeError::invalid_geometry(format!(
            "content must be non-empty, got {}x{}",
            content_width, content_height
        )));
    }
    if !margin_percent.is_finite() || margin_percent < 0.0 {
        return Err(NormalizeError::config_value_error(
            "margin percent",
            margin_percent,
            ">= 0",
        ));
    }
    if !target_ratio.is_finite() || target_ratio <= 0.0 {
        return Err(NormalizeError::config_value_error(
            "target ratio",
            target_ratio,
            "> 0",
        ));
    }

    let larger = f64::from(content_width.max(content_height));
    let margin_px = to_pixels((larger * margin_percent / 100.0).floor(), "margin")?;

    let width_with_margin = padded(content_width, margin_px)?;
    let height_with_margin = padded(content_height, margin_px)?;

    let current_ratio = f64::from(width_with_margin) / f64::from(height_with_margin);

    let (final_width, final_height) = if current_ratio > target_ratio {
        // too wide: grow height
        let height = to_pixels(
            (f64::from(width_with_margin) / target_ratio).floor(),
            "canvas height",
        )?;
        (width_with_margin, height)
    } else {
        let width = to_pixels(
            (f64::from(height_with_margin) * target_ratio).floor(),
            "canvas width",
        )?;
        (width, height_with_margin)
    };

    let final_width = final_width.max(width_with_margin);
    let final_height = final_height.max(height_with_margin);
    let area = u64::from(final_width) * u64::from(final_height);
    if area > MAX_CANVAS_PIXELS {
        return Err(NormalizeError::invalid_geometry(format!(
            "canvas {}x{} exceeds {} pixels",
            final_width, final_height, MAX_CANVAS_PIXELS
        )));
    }

    tracing::trace!(
        content_width,
        content_height,
        margin_px,
        final_width,
        final_height,
        "canvas fitted"
    );

    Ok(CanvasFit {
        final_width,
        final_height,
        margin_px,
    })
}

fn padded(dimension: u32, margin_px: u32) -> Result<u32> {
    margin_px
        .checked_mul(2)
        .and_then(|both| dimension.checked_add(both))
        .ok_or_else(|| {
            NormalizeError::invalid_geometry(format!(
                "padded dimension overflows: {} + 2 * {}",
                dimension, margin_px
            ))
        })
}

fn to_pixels(value: f64, what: &str) -> Result<u32> {
    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
        Ok(value as u32)
    } else {
        Err(NormalizeError::invalid_geometry(format!(
            "{} out of range: {}",
            what, value
        )))
    }
}
