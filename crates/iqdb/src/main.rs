//! iqdb CLI - compute and inspect Haar wavelet image signatures.
//!
//! Signatures are the compact perceptual fingerprints used by iqdb-style
//! similarity search. This tool produces them from image files and decodes
//! them back for inspection.
//!
//! # Usage
//!
//! ```bash
//! # Fingerprint a single image
//! iqdb hash image.jpg
//!
//! # Fingerprint a directory, one signature per line
//! iqdb hash ./photos/ --format text --output signatures.txt
//!
//! # Inspect a signature
//! iqdb parse iqdb_3fd03d19c7f9fb63...
//!
//! # View configuration
//! iqdb config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// iqdb - Haar wavelet image signatures for similarity search.
#[derive(Parser, Debug)]
#[command(name = "iqdb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute signatures for image files or directories
    Hash(cli::hash::HashArgs),

    /// Decode signature strings into averages and coefficients
    Parse(cli::parse::ParseArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match iqdb_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `iqdb config path`."
            );
            iqdb_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("iqdb v{}", iqdb_core::VERSION);

    match cli.command {
        Commands::Hash(args) => cli::hash::execute(args, config).await,
        Commands::Parse(args) => cli::parse::execute(args),
        Commands::Config(args) => cli::config::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["iqdb", "parse", "iqdb_00", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Parse(_)));
    }
}
