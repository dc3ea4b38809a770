//! Source image wrapper.

use std::path::Path;

use image::{DynamicImage, GrayImage};

use crate::error::{Error, Result};
use crate::geometry::FrameSize;

/// The raster page being analyzed.
///
/// Immutable for the duration of an analysis run; the engine only reads it.
#[derive(Debug, Clone)]
pub struct ImageFrame {
    image: DynamicImage,
}

impl ImageFrame {
    /// Decode an image file.
    ///
    /// Any IO or decoding failure is reported as [`Error::ImageRead`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| Error::ImageRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        log::debug!("Loaded {} ({}x{})", path.display(), image.width(), image.height());
        Ok(Self { image })
    }

    /// Decode an image held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).map_err(|e| Error::ImageRead {
            path: "<memory>".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { image })
    }

    /// Wrap an already decoded image.
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Pixel dimensions.
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.image.width(), self.image.height())
    }

    /// Borrow the underlying image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Grayscale copy of the frame.
    pub fn to_gray(&self) -> GrayImage {
        self.image.to_luma8()
    }
}

impl From<DynamicImage> for ImageFrame {
    fn from(image: DynamicImage) -> Self {
        Self::from_image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_size_from_image() {
        let frame = ImageFrame::from_image(DynamicImage::ImageRgb8(RgbImage::new(320, 240)));
        assert_eq!(frame.size(), FrameSize::new(320, 240));
    }

    #[test]
    fn test_open_missing_file_is_image_read_error() {
        let err = ImageFrame::open("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, Error::ImageRead { .. }));
    }

    #[test]
    fn test_from_garbage_bytes_is_image_read_error() {
        let err = ImageFrame::from_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, Error::ImageRead { .. }));
    }

    #[test]
    fn test_to_gray_keeps_dimensions() {
        let img = RgbImage::from_pixel(10, 4, Rgb([255, 255, 255]));
        let frame = ImageFrame::from(DynamicImage::ImageRgb8(img));
        let gray = frame.to_gray();
        assert_eq!(gray.dimensions(), (10, 4));
        assert_eq!(gray.get_pixel(0, 0).0[0], 255);
    }
}
