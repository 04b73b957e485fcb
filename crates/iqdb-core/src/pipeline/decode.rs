//! Image decoding with format detection, dimension limits and a timeout.
//!
//! This is the raster-producing collaborator of the signature pipeline: it
//! turns file bytes into a `DynamicImage` and refuses inputs that are empty
//! or larger than configured.

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::{DecodeError, PipelineError};

/// Image decoder with configurable limits and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Encoded size in bytes
    pub file_size: u64,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and decode an image file.
    pub async fn decode(&self, path: &Path) -> Result<DecodedImage, PipelineError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read file: {}", e),
            })?;
        self.decode_from_bytes(bytes, path).await
    }

    /// Decode an in-memory image on the blocking pool, bounded by the
    /// configured timeout. `path` is only used for error context.
    pub async fn decode_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
    ) -> Result<DecodedImage, PipelineError> {
        let path_owned = path.to_path_buf();
        let timeout_ms = self.limits.decode_timeout_ms;

        let task = tokio::task::spawn_blocking(move || decode_sync(bytes, &path_owned));
        let decoded = match timeout(Duration::from_millis(timeout_ms), task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join)) => {
                return Err(PipelineError::Decode {
                    path: path.to_path_buf(),
                    message: format!("Task join error: {}", join),
                })
            }
            Err(_) => {
                return Err(PipelineError::Timeout {
                    path: path.to_path_buf(),
                    stage: "decode".to_string(),
                    timeout_ms,
                })
            }
        };

        self.check_dimensions(&decoded, path)?;
        Ok(decoded)
    }

    fn check_dimensions(&self, decoded: &DecodedImage, path: &Path) -> Result<(), PipelineError> {
        let (width, height) = (decoded.width, decoded.height);
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptyImage {
                path: path.to_path_buf(),
                width,
                height,
            });
        }

        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }
        Ok(())
    }
}

/// Synchronous decode (runs in spawn_blocking). Content sniffing wins over
/// the file extension.
fn decode_sync(bytes: Vec<u8>, path: &Path) -> Result<DecodedImage, PipelineError> {
    let file_size = bytes.len() as u64;
    let decode_err = |message: String| PipelineError::Decode {
        path: path.to_path_buf(),
        message,
    };

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?;
    let format = reader
        .format()
        .or_else(|| ImageFormat::from_path(path).ok())
        .ok_or_else(|| PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        })?;

    let image = reader
        .decode()
        .map_err(|e| PipelineError::Image {
            path: path.to_path_buf(),
            source: DecodeError::Image(e),
        })?;
    let (width, height) = image.dimensions();

    Ok(DecodedImage {
        image,
        format,
        width,
        height,
        file_size,
    })
}

/// Short lowercase name of an image format.
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        _ => "unknown",
    }
}
