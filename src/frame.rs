//! Immutable video frames shared between the caller and the workers.

use std::fmt;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, RgbImage, Rgba};

/// A decoded RGB frame.
///
/// Cloning is cheap: the pixel buffer is shared, so the same frame can be
/// displayed, fingerprinted and handed to a worker without copying.
#[derive(Clone)]
pub struct Frame {
    image: Arc<RgbImage>,
}

impl Frame {
    /// Wrap an RGB8 buffer. Returns `None` if the buffer length does not
    /// match `width * height * 3`.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(Self::from_image)
    }

    /// Convert an RGBA8 buffer, dropping alpha.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let rgba = ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, data)?;
        Some(Self::from_image(DynamicImage::ImageRgba8(rgba).to_rgb8()))
    }

    pub fn from_image(image: RgbImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// A frame filled with a single color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::from_image(RgbImage::from_pixel(width, height, image::Rgb(rgb)))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Raw RGB8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
