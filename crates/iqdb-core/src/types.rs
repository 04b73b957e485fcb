//! Serializable records produced by the file pipeline and the CLI.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::output::TextRecord;
use crate::signature::Signature;

/// Signature of one image file, with the file facts gathered on the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// Path of the source file
    pub file_path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// Source image width in pixels
    pub width: u32,

    /// Source image height in pixels
    pub height: u32,

    /// Detected format ("jpeg", "png", "webp", etc.)
    pub format: String,

    /// File size in bytes
    pub file_size: u64,

    /// Printable `iqdb_…` signature
    pub signature: Signature,
}

impl TextRecord for FingerprintRecord {
    fn text_line(&self) -> String {
        format!("{}\t{}", self.signature, self.file_path.display())
    }
}

/// Per-channel values keyed by YIQ channel name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channels<T> {
    pub y: T,
    pub i: T,
    pub q: T,
}

/// Decoded view of a signature, for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSummary {
    /// Canonical printable form
    pub signature: Signature,

    /// Normalized channel averages
    pub averages: Channels<f64>,

    /// Signed coefficient positions per channel
    pub coefficients: Channels<Vec<i16>>,
}

impl From<&Signature> for SignatureSummary {
    fn from(signature: &Signature) -> Self {
        let [y, i, q] = *signature.averages();
        let [cy, ci, cq] = signature.coefficients();
        Self {
            signature: *signature,
            averages: Channels { y, i, q },
            coefficients: Channels {
                y: cy.to_vec(),
                i: ci.to_vec(),
                q: cq.to_vec(),
            },
        }
    }
}

impl TextRecord for SignatureSummary {
    fn text_line(&self) -> String {
        self.signature.to_string()
    }
}
