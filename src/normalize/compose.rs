//! Crop, center and flatten onto an opaque background

use crate::config::BackgroundColor;
use crate::error::{NormalizeError, Result};
use crate::normalize::bbox::BoundingBox;
use crate::normalize::fit::CanvasFit;
use image::{imageops, DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

/// Place the `bbox` region of `image` centered on a transparent canvas
///
/// Content alpha is copied as-is, not blended. Returns the canvas and the
/// top-left offset used.
///
/// # Errors
/// - `bbox` lies outside `image`
/// - The content is larger than the fitted canvas
pub fn place_on_canvas(
    image: &DynamicImage,
    bbox: BoundingBox,
    fit: &CanvasFit,
) -> Result<(RgbaImage, (u32, u32))> {
    let (width, height) = image.dimensions();
    if bbox.right > width
        || bbox.bottom > height
        || bbox.left > bbox.right
        || bbox.top > bbox.bottom
    {
        return Err(NormalizeError::invalid_geometry(format!(
            "bounding box {} outside {}x{} image",
            bbox, width, height
        )));
    }

    let (content_width, content_height) = (bbox.width(), bbox.height());
    if content_width > fit.final_width || content_height > fit.final_height {
        return Err(NormalizeError::invalid_geometry(format!(
            "content {}x{} does not fit canvas {}x{}",
            content_width, content_height, fit.final_width, fit.final_height
        )));
    }

    let content = image
        .crop_imm(bbox.left, bbox.top, content_width, content_height)
        .to_rgba8();

    let (offset_x, offset_y) = fit.offset_for(content_width, content_height);
    let mut canvas = RgbaImage::from_pixel(fit.final_width, fit.final_height, Rgba([0, 0, 0, 0]));
    imageops::replace(
        &mut canvas,
        &content,
        i64::from(offset_x),
        i64::from(offset_y),
    );

    Ok((canvas, (offset_x, offset_y)))
}

/// Flatten `canvas` onto `background`, using its alpha as the paste mask
///
/// Alpha 255 replaces the background, alpha 0 keeps it, anything between
/// blends linearly.
#[must_use]
pub fn flatten(canvas: &RgbaImage, background: BackgroundColor) -> RgbImage {
    let bg = background.to_rgb().0;

    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let Rgba([r, g, b, a]) = *canvas.get_pixel(x, y);
        Rgb([blend(r, bg[0], a), blend(g, bg[1], a), blend(b, bg[2], a)])
    })
}

/// Crop, center and flatten in one pass
///
/// # Errors
/// - Any error from [`place_on_canvas`]
pub fn compose(
    image: &DynamicImage,
    bbox: BoundingBox,
    fit: &CanvasFit,
    background: BackgroundColor,
) -> Result<RgbImage> {
    let (canvas, _) = place_on_canvas(image, bbox, fit)?;
    Ok(flatten(&canvas, background))
}

/// `(fg * a + bg * (255 - a)) / 255`, rounded
#[inline]
fn blend(foreground: u8, background: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    let t = u32::from(foreground) * a + u32::from(background) * (255 - a) + 128;
    ((t + (t >> 8)) >> 8) as u8
}
