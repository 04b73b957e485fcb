//! File pipeline around the signature transform.
//!
//! - **discovery**: Find image files in directories
//! - **validate**: Size and magic-byte checks before decoding
//! - **decode**: Decode with limits and a timeout
//! - **channel**: Bounded fan-out for batches
//! - **processor**: Orchestrates the full pipeline

pub mod channel;
pub mod decode;
pub mod discovery;
pub mod processor;
pub mod validate;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use processor::{FingerprintOutcome, ImageProcessor};
pub use validate::Validator;
