//! iqdb Core - Haar wavelet image signatures.
//!
//! Computes the compact perceptual fingerprint used by iqdb-style similarity
//! search, and converts it to and from its fixed-length printable form.
//!
//! # Architecture
//!
//! Every stage is a pure function of its input:
//!
//! ```text
//! Image → Resample (128×128) → YIQ → 2D Haar → Top-40 coefficients → Signature ⇄ "iqdb_…"
//! ```
//!
//! Around that core sits a small file pipeline (validation, decoding with
//! limits and timeouts, directory discovery) used by the `iqdb` CLI.
//!
//! # Usage
//!
//! ```rust,no_run
//! use iqdb_core::Signature;
//!
//! let bytes = std::fs::read("image.png")?;
//! let signature = Signature::from_blob(&bytes)?;
//! let hash = signature.to_string();
//!
//! let parsed: Signature = hash.parse()?;
//! assert_eq!(parsed, signature);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod signature;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, DecodeError, FormatError, IqdbError, PipelineError, Result,
};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{DiscoveredFile, FileDiscovery, ImageProcessor};
pub use signature::Signature;
pub use types::{FingerprintRecord, SignatureSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
