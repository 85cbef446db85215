//! Dupekit CLI - find duplicate files, tracks and photos.
//!
//! Dupekit fingerprints every file under a path, groups duplicates through an
//! exact → perceptual → metadata cascade and reports one canonical keeper per
//! group. It only reports; nothing is moved or deleted.
//!
//! # Usage
//!
//! ```bash
//! # Scan a library and write a JSON report
//! dupekit scan ~/Music --output report.json
//!
//! # Byte-identical files only, one group per line
//! dupekit scan ./photos --strategy exact-only --format jsonl
//!
//! # What does this file duplicate?
//! dupekit match song.wav ~/Music --limit 5
//!
//! # Show a single file's fingerprint
//! dupekit hash photo.jpg
//!
//! # View configuration
//! dupekit config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Dupekit - identity resolution and deduplication for media libraries.
#[derive(Parser, Debug)]
#[command(name = "dupekit")]
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
    /// Find duplicate groups under a path
    Scan(cli::scan::ScanArgs),

    /// Find everything under a path that duplicates one file
    Match(cli::matches::MatchArgs),

    /// Print the fingerprint of a single file
    Hash(cli::hash::HashArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match dupekit_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `dupekit config path`."
            );
            dupekit_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Dupekit v{}", dupekit_core::VERSION);

    match cli.command {
        Commands::Scan(args) => cli::scan::execute(args, config).await,
        Commands::Match(args) => cli::matches::execute(args, config).await,
        Commands::Hash(args) => cli::hash::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
