//! Error types for signature computation and parsing.
//!
//! The pure transform (resample, color conversion, wavelet, selection) cannot
//! fail. Errors come from the edges: decoding image bytes, parsing signature
//! strings, loading configuration and reading files.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for iqdb operations.
#[derive(Error, Debug)]
pub enum IqdbError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Image bytes could not be turned into a raster
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Signature string could not be parsed
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// The input could not be interpreted as a raster image.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The image decoder rejected the bytes (corrupt or unsupported format)
    #[error("Cannot decode image: {0}")]
    Image(#[from] image::ImageError),

    /// The decoded raster has no pixels
    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// A signature string is truncated or contains malformed hex.
///
/// Offsets are byte positions in the hex body, after the `iqdb_` prefix
/// has been stripped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Fewer characters remain than the next field needs
    #[error("Signature truncated in {field} at offset {offset}: need {needed} hex digits, {remaining} left")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A field contains a character outside `[0-9a-fA-F]`
    #[error("Invalid hex {chunk:?} in {field} at offset {offset}")]
    InvalidHex {
        field: &'static str,
        offset: usize,
        chunk: String,
    },
}

/// File pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// File could not be read, or a worker task failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Bytes were read but do not form a usable raster
    #[error("Cannot decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Decoded image has a zero dimension
    #[error("Empty image: {path} ({width}x{height})")]
    EmptyImage {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for iqdb results.
pub type Result<T> = std::result::Result<T, IqdbError>;
