//! Content bounding box over the alpha channel

use image::{DynamicImage, GenericImageView};
use serde::Serialize;

/// Minimal rectangle enclosing all pixels with alpha > 0
///
/// `right` and `bottom` are exclusive, so a single opaque pixel at `(x, y)`
/// yields `(x, y, x + 1, y + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Box covering the whole `width` x `height` extent
    #[must_use]
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.right - self.left
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.bottom - self.top
    }

    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    #[must_use]
    pub const fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.right, self.bottom)
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Compute the content box of `image`
///
/// Images without an alpha channel count as opaque everywhere. A fully
/// transparent image yields the full extent rather than an empty box.
/// Wider alpha formats are judged after 8-bit quantization, the same
/// conversion the compositor applies, so alpha that rounds to zero is
/// not content.
#[must_use]
pub fn extract_bbox(image: &DynamicImage) -> BoundingBox {
    let (width, height) = image.dimensions();
    if !image.color().has_alpha() {
        return BoundingBox::full(width, height);
    }

    let found = match image {
        DynamicImage::ImageRgba8(buffer) => {
            scan(width, height, |x, y| buffer.get_pixel(x, y).0[3] > 0)
        },
        _ => {
            let rgba = image.to_rgba8();
            scan(width, height, |x, y| rgba.get_pixel(x, y).0[3] > 0)
        },
    };

    found.unwrap_or_else(|| BoundingBox::full(width, height))
}

/// Row-major scan tracking the extreme covered coordinates
fn scan<F>(width: u32, height: u32, covered: F) -> Option<BoundingBox>
where
    F: Fn(u32, u32) -> bool,
{
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for y in 0..height {
        for x in 0..width {
            if !covered(x, y) {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                },
            });
        }
    }

    bounds.map(|(min_x, min_y, max_x, max_y)| {
        BoundingBox::new(min_x, min_y, max_x + 1, max_y + 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

    fn transparent(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]))
    }

    #[test]
    fn test_single_pixel_box_is_exclusive() {
        let mut image = transparent(10, 8);
        image.put_pixel(4, 3, Rgba([255, 0, 0, 255]));

        let bbox = extract_bbox(&DynamicImage::ImageRgba8(image));
        assert_eq!(bbox, BoundingBox::new(4, 3, 5, 4));
        assert_eq!(bbox.width(), 1);
        assert_eq!(bbox.height(), 1);
    }

    #[test]
    fn test_faint_alpha_counts_as_content() {
        let mut image = transparent(20, 20);
        image.put_pixel(2, 15, Rgba([0, 0, 0, 1]));
        image.put_pixel(17, 4, Rgba([10, 10, 10, 200]));

        let bbox = extract_bbox(&DynamicImage::ImageRgba8(image));
        assert_eq!(bbox.as_tuple(), (2, 4, 18, 16));
    }

    #[test]
    fn test_fully_transparent_returns_full_extent() {
        let image = DynamicImage::ImageRgba8(transparent(7, 5));
        assert_eq!(extract_bbox(&image), BoundingBox::full(7, 5));
    }

    #[test]
    fn test_image_without_alpha_is_opaque() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 9, Rgb([0, 0, 0])));
        assert_eq!(extract_bbox(&image), BoundingBox::full(12, 9));
    }

    #[test]
    fn test_luma_alpha_and_sixteen_bit_inputs() {
        let mut luma: ImageBuffer<LumaA<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(6, 6, LumaA([0, 0]));
        luma.put_pixel(1, 2, LumaA([90, 255]));
        let bbox = extract_bbox(&DynamicImage::ImageLumaA8(luma));
        assert_eq!(bbox, BoundingBox::new(1, 2, 2, 3));

        let mut wide: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        wide.put_pixel(3, 0, Rgba([0, 0, 0, 65535]));
        let bbox = extract_bbox(&DynamicImage::ImageRgba16(wide));
        assert_eq!(bbox, BoundingBox::new(3, 0, 4, 1));
    }

    #[test]
    fn test_sixteen_bit_alpha_that_quantizes_to_zero_is_not_content() {
        let mut wide: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(50, 50, Rgba([0, 0, 0, 0]));
        // 100 / 65535 rounds to 0 at 8 bits, 40000 / 65535 does not
        wide.put_pixel(10, 10, Rgba([65535, 0, 0, 100]));
        wide.put_pixel(30, 20, Rgba([0, 65535, 0, 40000]));
        let bbox = extract_bbox(&DynamicImage::ImageRgba16(wide));
        assert_eq!(bbox, BoundingBox::new(30, 20, 31, 21));

        let mut faint: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(6, 4, Rgba([0, 0, 0, 0]));
        faint.put_pixel(2, 2, Rgba([0, 0, 0, 100]));
        assert_eq!(
            extract_bbox(&DynamicImage::ImageRgba16(faint)),
            BoundingBox::full(6, 4)
        );
    }

    #[test]
    fn test_contains() {
        let bbox = BoundingBox::new(2, 2, 4, 5);
        assert!(bbox.contains(2, 2));
        assert!(bbox.contains(3, 4));
        assert!(!bbox.contains(4, 4));
        assert!(!bbox.contains(3, 5));
        assert_eq!(bbox.to_string(), "(2, 2, 4, 5)");
    }
}
