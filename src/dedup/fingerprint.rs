//! Downscaled grayscale fingerprint of a frame.

use image::imageops::{self, FilterType};
use ndarray::Array2;
use sha2::{Digest, Sha256};

use crate::frame::Frame;

/// Bytes of the SHA-256 digest kept for logging.
const DIGEST_LEN: usize = 8;

/// A small single-channel thumbnail plus a short content digest.
///
/// The digest is only for logs; similarity is decided on the pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    pixels: Array2<u8>,
    digest: [u8; DIGEST_LEN],
}

impl Fingerprint {
    /// Downscale `frame` to `size`×`size`, convert to intensity and hash it.
    pub fn compute(frame: &Frame, size: u32) -> Self {
        let size = size.max(1);
        let small = imageops::resize(frame.image(), size, size, FilterType::Triangle);
        let gray = imageops::grayscale(&small);

        let pixels = Array2::from_shape_fn((size as usize, size as usize), |(y, x)| {
            gray.get_pixel(x as u32, y as u32).0[0]
        });

        let hash = Sha256::digest(gray.as_raw());
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&hash[..DIGEST_LEN]);

        Self { pixels, digest }
    }

    pub fn pixels(&self) -> &Array2<u8> {
        &self.pixels
    }

    pub fn hex(&self) -> String {
        self.digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Mean absolute intensity difference, in `[0, 255]`.
    ///
    /// Thumbnails of different sizes are never similar.
    pub fn mean_abs_diff(&self, other: &Fingerprint) -> f32 {
        if self.pixels.dim() != other.pixels.dim() {
            return f32::INFINITY;
        }
        let a = self.pixels.mapv(f32::from);
        let b = other.pixels.mapv(f32::from);
        (a - b).mapv(f32::abs).mean().unwrap_or(0.0)
    }
}
