//! Cheap checks before a file is handed to the decoder.

use std::io::Read;
use std::path::Path;

use image::ImageFormat;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Leading bytes of the formats the decoder is built with.
///
/// `None` bytes are wildcards (RIFF length field of WebP).
const SIGNATURES: &[(ImageFormat, &[Option<u8>])] = &[
    (ImageFormat::Jpeg, &[Some(0xFF), Some(0xD8), Some(0xFF)]),
    (
        ImageFormat::Png,
        &[Some(0x89), Some(b'P'), Some(b'N'), Some(b'G')],
    ),
    (
        ImageFormat::Gif,
        &[Some(b'G'), Some(b'I'), Some(b'F'), Some(b'8')],
    ),
    (
        ImageFormat::WebP,
        &[
            Some(b'R'),
            Some(b'I'),
            Some(b'F'),
            Some(b'F'),
            None,
            None,
            None,
            None,
            Some(b'W'),
            Some(b'E'),
            Some(b'B'),
            Some(b'P'),
        ],
    ),
    (
        ImageFormat::Tiff,
        &[Some(b'I'), Some(b'I'), Some(0x2A), Some(0x00)],
    ),
    (
        ImageFormat::Tiff,
        &[Some(b'M'), Some(b'M'), Some(0x00), Some(0x2A)],
    ),
    (ImageFormat::Bmp, &[Some(b'B'), Some(b'M')]),
];

/// Identify an image format from the first bytes of a file.
pub fn sniff_format(header: &[u8]) -> Option<ImageFormat> {
    SIGNATURES.iter().find_map(|(format, magic)| {
        let matches = header.len() >= magic.len()
            && magic
                .iter()
                .zip(header)
                .all(|(expected, actual)| expected.map_or(true, |b| b == *actual));
        matches.then_some(*format)
    })
}

/// Validates files before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check that `path` exists, is within the size limit and starts with
    /// a known image signature.
    pub fn validate(&self, path: &Path) -> Result<ImageFormat, PipelineError> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::FileNotFound(path.to_path_buf()),
            _ => PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read metadata: {}", e),
            },
        })?;

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let mut header = Vec::with_capacity(12);
        std::fs::File::open(path)
            .and_then(|file| file.take(12).read_to_end(&mut header))
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot open file: {}", e),
            })?;

        sniff_format(&header).ok_or_else(|| PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: "unrecognized (invalid magic bytes)".to_string(),
        })
    }
}
