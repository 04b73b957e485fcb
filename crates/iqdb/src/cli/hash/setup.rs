//! Resolve CLI flags against the configuration file.

use std::path::PathBuf;
use std::sync::Arc;

use iqdb_core::{Config, ImageProcessor, OutputFormat as CoreOutputFormat};

use super::{HashArgs, HashContext};

/// Check inputs and assemble everything needed for fingerprinting.
///
/// Flags win over the configuration file.
pub fn setup_processor(args: &HashArgs, config: Config) -> anyhow::Result<HashContext> {
    if let Some(missing) = args.inputs.iter().find(|input| !input.exists()) {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            missing
        );
    }

    let output_format = match args.format {
        Some(format) => CoreOutputFormat::from(format),
        // Validated when the config was loaded
        None => CoreOutputFormat::parse(&config.output.format).unwrap_or(CoreOutputFormat::JsonLines),
    };

    let output_path = match &args.output {
        Some(path) => Some(PathBuf::from(
            shellexpand::tilde(&path.to_string_lossy()).into_owned(),
        )),
        None => config.output_path(),
    };

    if args.skip_existing && output_path.is_none() {
        anyhow::bail!("--skip-existing needs an output file (--output or output.path)");
    }

    let workers = args.parallel.unwrap_or(config.processing.parallel_workers);
    if workers == 0 {
        anyhow::bail!("--parallel must be at least 1");
    }

    let processor = ImageProcessor::new(&config).with_workers(workers);
    tracing::debug!(
        "Hashing with {} worker(s), format {:?}, output {:?}",
        workers,
        output_format,
        output_path
    );

    Ok(HashContext {
        processor: Arc::new(processor),
        output_format,
        output_path,
        pretty: args.pretty || config.output.pretty,
    })
}
