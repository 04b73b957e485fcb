//! The `iqdb parse` command for inspecting signature strings.

use clap::Args;
use iqdb_core::{OutputWriter, Signature, SignatureSummary};

use super::hash::OutputFormat;

/// Arguments for the `parse` command.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Signature strings (`iqdb_` followed by 532 hex digits)
    #[arg(required = true)]
    pub signatures: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Decode each signature, failing on the first malformed one.
fn summarize(signatures: &[String]) -> anyhow::Result<Vec<SignatureSummary>> {
    signatures
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let signature = Signature::parse(text.trim())
                .map_err(|e| anyhow::anyhow!("Signature #{} is malformed: {}", index + 1, e))?;
            Ok(SignatureSummary::from(&signature))
        })
        .collect()
}

/// Execute the parse command.
pub fn execute(args: ParseArgs) -> anyhow::Result<()> {
    let summaries = summarize(&args.signatures)?;
    let format = iqdb_core::OutputFormat::from(args.format);

    let stdout = std::io::stdout();
    let mut writer = OutputWriter::new(stdout.lock(), format, true);
    if format.is_streaming() {
        for summary in &summaries {
            writer.write(summary)?;
        }
    } else {
        writer.write_all(&summaries)?;
    }
    writer.flush()?;

    tracing::debug!("Decoded {} signature(s)", summaries.len());
    Ok(())
}
