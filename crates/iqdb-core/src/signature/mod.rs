//! Haar wavelet image signatures.
//!
//! A signature is built in five pure stages:
//! - **resample**: scale the source raster to a 128×128 canonical raster
//! - **color**: convert RGB samples to YIQ planes
//! - **wavelet**: apply a 2D Haar decomposition to each plane
//! - **select**: keep the 40 largest coefficients per plane, with sign
//! - **codec**: format to and parse from the `iqdb_…` string

mod codec;
mod color;
mod resample;
mod select;
mod wavelet;

use image::{DynamicImage, GenericImageView, RgbImage};

use crate::error::DecodeError;

/// Prefix of the printable signature form.
pub const PREFIX: &str = "iqdb_";

/// Side length of the canonical raster.
pub const IMAGE_SIZE: usize = 128;

/// Number of samples in one canonical plane.
pub const NUM_PIXELS: usize = IMAGE_SIZE * IMAGE_SIZE;

/// Number of color channels (Y, I, Q).
pub const NUM_CHANNELS: usize = 3;

/// Number of coefficients kept per channel.
pub const NUM_COEFS: usize = 40;

/// Length of the printable signature, prefix included.
pub const HASH_LEN: usize = PREFIX.len() + NUM_CHANNELS * 16 + NUM_CHANNELS * NUM_COEFS * 4;

/// Perceptual fingerprint of an image.
///
/// `averages` holds the normalized DC term of each YIQ channel.
/// `coefficients` holds, per channel, the 40 most significant wavelet
/// positions as signed flat indices (negative when the coefficient was
/// negative), sorted ascending by signed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signature {
    averages: [f64; NUM_CHANNELS],
    coefficients: [[i16; NUM_COEFS]; NUM_CHANNELS],
}

impl Signature {
    /// Compute the signature of an encoded image (PNG, JPEG, GIF, ...).
    pub fn from_blob(blob: &[u8]) -> Result<Self, DecodeError> {
        let image = image::load_from_memory(blob)?;
        Self::from_image(&image)
    }

    /// Compute the signature of a decoded image.
    ///
    /// Transparent pixels are composited onto black before resampling.
    pub fn from_image(image: &DynamicImage) -> Result<Self, DecodeError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::Empty { width, height });
        }
        Ok(Self::from_rgb(&resample::flatten(image)))
    }

    /// Compute the signature of an opaque RGB raster of any non-zero size.
    ///
    /// # Panics
    ///
    /// Panics if the raster has a zero dimension.
    pub fn from_rgb(raster: &RgbImage) -> Self {
        assert!(
            raster.width() > 0 && raster.height() > 0,
            "raster must have at least one pixel"
        );

        let canonical = resample::canonical(raster);
        let mut planes = color::rgb_to_yiq(&canonical);

        let mut averages = [0.0; NUM_CHANNELS];
        let mut coefficients = [[0i16; NUM_COEFS]; NUM_CHANNELS];
        for (channel, plane) in planes.iter_mut().enumerate() {
            averages[channel] = wavelet::transform(plane);
            coefficients[channel] = select::largest_coefficients(plane);
        }

        Self {
            averages,
            coefficients,
        }
    }

    /// Normalized average intensity of each channel.
    pub fn averages(&self) -> &[f64; NUM_CHANNELS] {
        &self.averages
    }

    /// Signed coefficient positions of every channel.
    pub fn coefficients(&self) -> &[[i16; NUM_COEFS]; NUM_CHANNELS] {
        &self.coefficients
    }

    /// Signed coefficient positions of one channel (0 = Y, 1 = I, 2 = Q).
    ///
    /// # Panics
    ///
    /// Panics if `channel >= 3`.
    pub fn channel(&self, channel: usize) -> &[i16; NUM_COEFS] {
        &self.coefficients[channel]
    }
}
