//! The `iqdb hash` command for fingerprinting images.

mod batch;
mod setup;
pub mod types;

pub use types::OutputFormat;

use clap::Args;
use iqdb_core::{Config, FileDiscovery, ImageProcessor, OutputFormat as CoreOutputFormat};
use std::path::PathBuf;
use std::sync::Arc;

use batch::process_batch;
use setup::setup_processor;

/// Arguments for the `hash` command.
#[derive(Args, Debug, Default)]
pub struct HashArgs {
    /// Image files or directories to fingerprint
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file (defaults to output.path from config, then stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to output.format from config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of parallel workers (defaults to processing.parallel_workers)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Skip images already present in the output file
    #[arg(long)]
    pub skip_existing: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Processing context assembled by setup_processor().
pub(crate) struct HashContext {
    pub processor: Arc<ImageProcessor>,
    pub output_format: CoreOutputFormat,
    pub output_path: Option<PathBuf>,
    pub pretty: bool,
}

/// Execute the hash command.
pub async fn execute(args: HashArgs, config: Config) -> anyhow::Result<()> {
    let ctx = setup_processor(&args, config)?;

    let files = ctx.processor.discover(&args.inputs);
    if files.is_empty() {
        tracing::warn!("No supported image files found in {:?}", args.inputs);
        return Ok(());
    }
    tracing::info!(
        "Found {} image(s) to fingerprint ({:.1} MB)",
        files.len(),
        FileDiscovery::total_size(&files) as f64 / 1_000_000.0
    );

    process_batch(ctx, &args, files).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: HashArgs,
    }

    #[test]
    fn test_default_args_leave_options_unset() {
        let args = HashArgs::default();
        assert!(args.output.is_none());
        assert!(args.format.is_none());
        assert!(args.parallel.is_none());
        assert!(!args.skip_existing);
    }

    #[test]
    fn test_parse_flags() {
        let harness = Harness::try_parse_from([
            "hash", "a.png", "photos/", "-f", "text", "-p", "8", "-o", "out.txt",
        ])
        .unwrap();
        let args = harness.args;
        assert_eq!(args.inputs, vec![PathBuf::from("a.png"), PathBuf::from("photos/")]);
        assert_eq!(args.format, Some(OutputFormat::Text));
        assert_eq!(args.parallel, Some(8));
        assert_eq!(args.output, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn test_input_required() {
        assert!(Harness::try_parse_from(["hash"]).is_err());
    }

    fn write_png(dir: &std::path::Path, name: &str, seed: u8) -> PathBuf {
        use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

        let path = dir.join(name);
        DynamicImage::ImageRgb8(RgbImage::from_fn(20, 30, |x, y| {
            Rgb([(x * 10) as u8, (y * 5) as u8, seed])
        }))
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
        path
    }

    fn run_args(inputs: Vec<PathBuf>, output: &std::path::Path, format: OutputFormat) -> HashArgs {
        HashArgs {
            inputs,
            output: Some(output.to_path_buf()),
            format: Some(format),
            no_progress: true,
            ..HashArgs::default()
        }
    }

    fn json_paths(output: &std::path::Path) -> Vec<PathBuf> {
        let records: Vec<iqdb_core::FingerprintRecord> =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        records.into_iter().map(|r| r.file_path).collect()
    }

    #[tokio::test]
    async fn test_execute_writes_text_output() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = write_png(dir.path(), "in.png", 77);

        let output = dir.path().join("out.txt");
        let args = run_args(vec![image_path.clone()], &output, OutputFormat::Text);
        execute(args, Config::default()).await.unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let (hash, path) = text.trim_end().split_once('\t').unwrap();
        let expected = iqdb_core::Signature::from_blob(&std::fs::read(&image_path).unwrap()).unwrap();
        assert_eq!(hash, expected.to_string());
        assert_eq!(PathBuf::from(path), image_path);
    }

    #[tokio::test]
    async fn test_skip_existing_merges_jsonl_into_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 1);
        let b = write_png(dir.path(), "b.png", 2);
        let output = dir.path().join("out.json");

        execute(run_args(vec![a.clone()], &output, OutputFormat::Jsonl), Config::default())
            .await
            .unwrap();

        let mut args = run_args(vec![a.clone(), b.clone()], &output, OutputFormat::Json);
        args.skip_existing = true;
        execute(args, Config::default()).await.unwrap();

        assert_eq!(json_paths(&output), vec![a, b]);
    }

    #[tokio::test]
    async fn test_skip_existing_refuses_text_into_json() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 1);
        let b = write_png(dir.path(), "b.png", 2);
        let output = dir.path().join("out");

        execute(run_args(vec![a.clone()], &output, OutputFormat::Text), Config::default())
            .await
            .unwrap();
        let before = std::fs::read_to_string(&output).unwrap();

        let mut args = run_args(vec![a, b], &output, OutputFormat::Json);
        args.skip_existing = true;
        let err = execute(args, Config::default()).await.unwrap_err();

        assert!(err.to_string().contains("text lines"), "{err}");
        assert_eq!(std::fs::read_to_string(&output).unwrap(), before);
    }

    #[tokio::test]
    async fn test_skip_existing_refuses_appending_to_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 1);
        let b = write_png(dir.path(), "b.png", 2);
        let output = dir.path().join("out.json");

        execute(run_args(vec![a.clone()], &output, OutputFormat::Json), Config::default())
            .await
            .unwrap();

        let mut args = run_args(vec![a.clone(), b], &output, OutputFormat::Jsonl);
        args.skip_existing = true;
        assert!(execute(args, Config::default()).await.is_err());

        assert_eq!(json_paths(&output), vec![a]);
    }

    #[tokio::test]
    async fn test_skip_existing_appends_matching_text() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 1);
        let b = write_png(dir.path(), "b.png", 2);
        let output = dir.path().join("out.txt");

        execute(run_args(vec![a.clone()], &output, OutputFormat::Text), Config::default())
            .await
            .unwrap();

        let mut args = run_args(vec![a.clone(), b.clone()], &output, OutputFormat::Text);
        args.skip_existing = true;
        execute(args, Config::default()).await.unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let paths: Vec<PathBuf> = text
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(_, path)| PathBuf::from(path))
            .collect();
        assert_eq!(paths, vec![a, b]);
    }
}
