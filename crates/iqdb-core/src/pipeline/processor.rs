//! Pipeline orchestration: validate, decode, fingerprint.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::config::{Config, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::signature::Signature;
use crate::types::FingerprintRecord;

use super::channel::fan_out;
use super::decode::{format_name, ImageDecoder};
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::validate::Validator;

/// Outcome of fingerprinting one discovered file.
#[derive(Debug)]
pub struct FingerprintOutcome {
    /// Position of the file in the batch
    pub position: usize,
    /// The file that was processed
    pub file: DiscoveredFile,
    /// Its record, or why it failed
    pub result: Result<FingerprintRecord>,
}

/// Turns image files into signature records.
pub struct ImageProcessor {
    decoder: ImageDecoder,
    validator: Validator,
    discovery: FileDiscovery,
    pipeline: PipelineConfig,
    workers: usize,
}

impl ImageProcessor {
    /// Create a new image processor with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
            pipeline: config.pipeline.clone(),
            workers: config.processing.parallel_workers,
        }
    }

    /// Override the number of concurrent workers used by `fingerprint_all`.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Discover all image files under the given inputs.
    pub fn discover(&self, inputs: &[std::path::PathBuf]) -> Vec<DiscoveredFile> {
        self.discovery.discover(inputs)
    }

    /// Fingerprint a single image file.
    pub async fn fingerprint(&self, path: &Path) -> Result<FingerprintRecord> {
        let start = Instant::now();
        tracing::debug!("Fingerprinting: {:?}", path);

        self.validator.validate(path)?;
        tracing::trace!("  Validate: {:?}", start.elapsed());

        let decode_start = Instant::now();
        let decoded = self.decoder.decode(path).await?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        let transform_start = Instant::now();
        let image = decoded.image;
        let signature = tokio::task::spawn_blocking(move || Signature::from_image(&image))
            .await
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            })?
            .map_err(|source| PipelineError::Image {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::trace!("  Signature: {:?}", transform_start.elapsed());

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        tracing::debug!(
            "Fingerprinted {:?} in {:?} ({}x{})",
            file_name,
            start.elapsed(),
            decoded.width,
            decoded.height
        );

        Ok(FingerprintRecord {
            file_path: path.to_path_buf(),
            file_name,
            width: decoded.width,
            height: decoded.height,
            format: format_name(decoded.format).to_string(),
            file_size: decoded.file_size,
            signature,
        })
    }

    /// Fingerprint many files concurrently.
    ///
    /// Outcomes arrive in completion order; `FingerprintOutcome::position`
    /// gives each file's place in `files`.
    pub fn fingerprint_all(
        self: &Arc<Self>,
        files: Vec<DiscoveredFile>,
    ) -> mpsc::Receiver<FingerprintOutcome> {
        let processor = Arc::clone(self);
        let mut results = fan_out(files, self.workers, &self.pipeline, move |file| {
            let processor = Arc::clone(&processor);
            async move {
                let result = processor.fingerprint(&file.path).await;
                (file, result)
            }
        });

        let (tx, rx) = mpsc::channel(self.pipeline.buffer_size);
        tokio::spawn(async move {
            while let Some((position, (file, result))) = results.recv().await {
                let outcome = FingerprintOutcome {
                    position,
                    file,
                    result,
                };
                if tx.send(outcome).await.is_err() {
                    break;
                }
            }
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IqdbError;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, seed: u8) -> std::path::PathBuf {
        let path = dir.join(name);
        let raster = RgbImage::from_fn(48, 32, |x, y| {
            Rgb([(x as u8).wrapping_mul(seed), (y as u8).wrapping_add(seed), seed])
        });
        DynamicImage::ImageRgb8(raster)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_fingerprint_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 3);

        let processor = ImageProcessor::new(&Config::default());
        let record = processor.fingerprint(&path).await.unwrap();

        assert_eq!(record.file_name, "a.png");
        assert_eq!((record.width, record.height), (48, 32));
        assert_eq!(record.format, "png");

        let blob = std::fs::read(&path).unwrap();
        assert_eq!(record.signature, Signature::from_blob(&blob).unwrap());
        assert_eq!(record.file_size, blob.len() as u64);
    }

    #[tokio::test]
    async fn test_fingerprint_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, "not an image").unwrap();

        let processor = ImageProcessor::new(&Config::default());
        let err = processor.fingerprint(&path).await.unwrap_err();
        assert!(matches!(
            err,
            IqdbError::Pipeline(PipelineError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_fingerprint_all_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "one.png", 1);
        write_png(dir.path(), "two.png", 2);
        std::fs::write(dir.path().join("three.png"), "garbage").unwrap();

        let processor = Arc::new(ImageProcessor::new(&Config::default()).with_workers(2));
        let files = processor.discover(&[dir.path().to_path_buf()]);
        assert_eq!(files.len(), 3);

        let mut rx = processor.fingerprint_all(files);
        let mut outcomes = Vec::new();
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes.sort_by_key(|o| o.position);

        let ok: Vec<bool> = outcomes.iter().map(|o| o.result.is_ok()).collect();
        // Sorted by path: one.png, three.png, two.png
        assert_eq!(ok, vec![true, false, true]);
        assert_ne!(
            outcomes[0].result.as_ref().unwrap().signature,
            outcomes[2].result.as_ref().unwrap().signature
        );
    }
}
