use super::MatteProvider;
use crate::error::Result;
use async_trait::async_trait;
use image::DynamicImage;

/// Keeps the input's own alpha; for sources that are already cut out
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughMatte;

#[async_trait]
impl MatteProvider for PassthroughMatte {
    async fn apply(&mut self, image: DynamicImage) -> Result<DynamicImage> {
        Ok(image)
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[tokio::test]
    async fn test_passthrough_returns_input() {
        let mut source = RgbaImage::new(3, 2);
        source.put_pixel(2, 1, Rgba([4, 5, 6, 7]));
        let out = PassthroughMatte
            .apply(DynamicImage::ImageRgba8(source))
            .await
            .unwrap();
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.get_pixel(2, 1), Rgba([4, 5, 6, 7]));
    }
}
