//! Batch fingerprinting: progress, skip-existing, streaming output.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use iqdb_core::{DiscoveredFile, FingerprintRecord, OutputFormat, OutputWriter, Signature};

use super::{HashArgs, HashContext};

/// What an earlier run already wrote to the output file.
#[derive(Debug, Default)]
struct ExistingOutput {
    /// Source paths that already have a signature
    paths: HashSet<PathBuf>,
    /// Full records (JSON array or JSON Lines), re-emitted when rewriting an array
    records: Vec<FingerprintRecord>,
    /// The file holds a single JSON array
    is_array: bool,
    /// Number of JSON Lines records
    json_lines: usize,
    /// Number of `<signature>\t<path>` lines
    text_lines: usize,
}

impl ExistingOutput {
    /// Fail unless the existing content can be kept when writing `format`.
    ///
    /// Streaming formats append, so the file must already hold lines of the
    /// same kind. JSON rewrites the whole array, so every existing entry must
    /// carry a full record.
    fn ensure_compatible(&self, format: OutputFormat, path: &Path) -> anyhow::Result<()> {
        let conflict = match format {
            OutputFormat::Json => (self.text_lines > 0).then_some("text lines"),
            OutputFormat::JsonLines if self.is_array => Some("a JSON array"),
            OutputFormat::JsonLines => (self.text_lines > 0).then_some("text lines"),
            OutputFormat::Text if self.is_array => Some("a JSON array"),
            OutputFormat::Text => (self.json_lines > 0).then_some("JSON Lines records"),
        };
        match conflict {
            Some(found) => anyhow::bail!(
                "--skip-existing: {} holds {}, which cannot be kept in {:?} output\n\n  \
                 Hint: Use the same --format as the earlier run, or a new output file.",
                path.display(),
                found,
                format
            ),
            None => Ok(()),
        }
    }
}

/// Fingerprint `files` and write the records in the selected format.
pub async fn process_batch(
    ctx: HashContext,
    args: &HashArgs,
    mut files: Vec<DiscoveredFile>,
) -> anyhow::Result<()> {
    let existing = match (&ctx.output_path, args.skip_existing) {
        (Some(path), true) => {
            let existing = load_existing(path)?;
            existing.ensure_compatible(ctx.output_format, path)?;
            existing
        }
        _ => ExistingOutput::default(),
    };
    let before = files.len();
    files.retain(|file| !existing.paths.contains(&file.path));
    let skipped = (before - files.len()) as u64;
    if skipped > 0 {
        tracing::info!("Skipping {} image(s) already in the output file", skipped);
    }

    let streaming = ctx.output_format.is_streaming();
    let sink: Box<dyn Write> = match &ctx.output_path {
        Some(path) => {
            let file = if streaming && args.skip_existing && path.exists() {
                OpenOptions::new().append(true).open(path)?
            } else {
                File::create(path)?
            };
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    let mut writer = OutputWriter::new(sink, ctx.output_format, ctx.pretty);

    let progress = create_progress_bar(files.len() as u64, args.no_progress);
    let mut succeeded: u64 = 0;
    let mut failed: u64 = 0;
    let mut total_bytes: u64 = 0;
    let start_time = Instant::now();
    // JSON needs every record before the array can be written
    let mut collected: Vec<(usize, FingerprintRecord)> = Vec::new();

    let mut outcomes = ctx.processor.fingerprint_all(files);
    while let Some(outcome) = outcomes.recv().await {
        match outcome.result {
            Ok(record) => {
                succeeded += 1;
                total_bytes += record.file_size;
                if streaming {
                    writer.write(&record)?;
                } else {
                    collected.push((outcome.position, record));
                }
            }
            Err(e) => {
                failed += 1;
                progress.suspend(|| tracing::error!("Failed: {:?} - {}", outcome.file.path, e));
            }
        }

        progress.inc(1);
        let elapsed = start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            let rate = (succeeded + failed) as f64 / elapsed;
            progress.set_message(format!("{:.1} img/sec", rate));
        }
    }

    if !streaming {
        collected.sort_by_key(|(position, _)| *position);
        let mut records = existing.records;
        records.extend(collected.into_iter().map(|(_, record)| record));
        writer.write_all(&records)?;
    }
    writer.flush()?;
    if let Some(path) = &ctx.output_path {
        tracing::info!("Output written to {:?}", path);
    }

    progress.finish_and_clear();
    print_summary(succeeded, failed, skipped, total_bytes, start_time.elapsed());

    if succeeded == 0 && failed > 0 {
        anyhow::bail!("All {} image(s) failed", failed);
    }
    Ok(())
}

/// Read the source paths and records of an existing output file.
///
/// Accepts a JSON array, JSON Lines, or text lines; unparseable lines are
/// counted and reported, and those images are fingerprinted again.
fn load_existing(path: &Path) -> anyhow::Result<ExistingOutput> {
    if !path.exists() {
        return Ok(ExistingOutput::default());
    }
    let content = std::fs::read_to_string(path)?;

    if let Ok(records) = serde_json::from_str::<Vec<FingerprintRecord>>(&content) {
        let paths = records.iter().map(|r| r.file_path.clone()).collect();
        return Ok(ExistingOutput {
            paths,
            records,
            is_array: true,
            ..ExistingOutput::default()
        });
    }

    let mut existing = ExistingOutput::default();
    let mut skipped_lines = 0u64;
    for line in content.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
        if let Ok(record) = serde_json::from_str::<FingerprintRecord>(line) {
            existing.paths.insert(record.file_path.clone());
            existing.records.push(record);
            existing.json_lines += 1;
            continue;
        }
        match line.split_once('\t') {
            Some((hash, file)) if Signature::parse(hash).is_ok() => {
                existing.paths.insert(PathBuf::from(file));
                existing.text_lines += 1;
            }
            _ => skipped_lines += 1,
        }
    }
    if skipped_lines > 0 {
        tracing::warn!(
            "--skip-existing: {skipped_lines} lines in output file could not be parsed; \
             those images will be fingerprinted again"
        );
    }
    Ok(existing)
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64, hidden: bool) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a summary table after batch processing.
fn print_summary(succeeded: u64, failed: u64, skipped: u64, total_bytes: u64, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let (rate, throughput) = if secs > 0.0 {
        (succeeded as f64 / secs, total_bytes as f64 / 1_000_000.0 / secs)
    } else {
        (0.0, 0.0)
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Fingerprinted: {:>7}", succeeded);
    if failed > 0 {
        eprintln!("    Failed:        {:>7}", failed);
    }
    if skipped > 0 {
        eprintln!("    Skipped:       {:>7}", skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:         {:>7}", succeeded + failed + skipped);
    eprintln!("    Duration:      {:>6.1}s", secs);
    eprintln!("    Rate:          {:>6.1} img/sec", rate);
    eprintln!("    Throughput:    {:>6.1} MB/sec", throughput);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample_record(path: &str) -> FingerprintRecord {
        FingerprintRecord {
            file_path: PathBuf::from(path),
            file_name: "image.jpg".to_string(),
            width: 100,
            height: 100,
            format: "jpeg".to_string(),
            file_size: 1000,
            signature: Signature::from_rgb(&RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]))),
        }
    }

    #[test]
    fn test_load_existing_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.json");
        let records = vec![sample_record("/a.jpg"), sample_record("/b.jpg")];
        std::fs::write(&path, serde_json::to_string_pretty(&records).unwrap()).unwrap();

        let existing = load_existing(&path).unwrap();
        assert_eq!(existing.records, records);
        assert!(existing.paths.contains(Path::new("/a.jpg")));
        assert!(existing.paths.contains(Path::new("/b.jpg")));
    }

    #[test]
    fn test_load_existing_jsonl_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.jsonl");
        let record = sample_record("/c.jpg");

        let mut content = serde_json::to_string(&record).unwrap();
        content.push('\n');
        content.push_str(&format!("{}\t/d.png\n", record.signature));
        content.push_str("garbage line\n\n");
        std::fs::write(&path, content).unwrap();

        let existing = load_existing(&path).unwrap();
        assert_eq!(existing.records, vec![record]);
        assert_eq!((existing.json_lines, existing.text_lines), (1, 1));
        assert_eq!(existing.paths.len(), 2);
        assert!(existing.paths.contains(Path::new("/c.jpg")));
        assert!(existing.paths.contains(Path::new("/d.png")));
    }

    #[test]
    fn test_load_existing_missing_file() {
        let existing = load_existing(Path::new("/nonexistent/out.jsonl")).unwrap();
        assert!(existing.paths.is_empty());
    }

    #[test]
    fn test_existing_output_compatibility() {
        let path = Path::new("out");
        let array = ExistingOutput {
            is_array: true,
            ..ExistingOutput::default()
        };
        let lines = ExistingOutput {
            json_lines: 2,
            ..ExistingOutput::default()
        };
        let text = ExistingOutput {
            text_lines: 2,
            ..ExistingOutput::default()
        };

        assert!(array.ensure_compatible(OutputFormat::Json, path).is_ok());
        assert!(array.ensure_compatible(OutputFormat::JsonLines, path).is_err());
        assert!(array.ensure_compatible(OutputFormat::Text, path).is_err());

        assert!(lines.ensure_compatible(OutputFormat::Json, path).is_ok());
        assert!(lines.ensure_compatible(OutputFormat::JsonLines, path).is_ok());
        assert!(lines.ensure_compatible(OutputFormat::Text, path).is_err());

        assert!(text.ensure_compatible(OutputFormat::Json, path).is_err());
        assert!(text.ensure_compatible(OutputFormat::JsonLines, path).is_err());
        assert!(text.ensure_compatible(OutputFormat::Text, path).is_ok());

        let empty = ExistingOutput::default();
        assert!(empty.ensure_compatible(OutputFormat::Text, path).is_ok());
    }
}
