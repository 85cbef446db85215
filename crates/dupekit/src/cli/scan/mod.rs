//! The `dupekit scan` command for finding duplicate groups.

mod report;
mod setup;
pub mod types;

pub use types::Category;
use types::{OutputFormat, Strategy};

use clap::Args;
use dupekit_core::{Config, Dedup, DedupReport};
use std::path::PathBuf;

use report::{create_progress_bar, print_summary, write_report};
use setup::{apply_overrides, resolve_format};

/// Arguments for the `scan` command.
#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// File or directory to scan
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Match strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Maximum Hamming distance for a perceptual match
    #[arg(long)]
    pub perceptual_threshold: Option<u32>,

    /// Minimum metadata similarity for audio, image and video items
    #[arg(long)]
    pub metadata_threshold: Option<f64>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Treat every file as this category instead of guessing from the extension
    #[arg(long, value_enum)]
    pub category: Option<Category>,

    /// Only scan these extensions (comma separated)
    #[arg(long = "ext", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Include dot-files and dot-directories
    #[arg(long)]
    pub include_hidden: bool,

    /// Skip image perceptual hashes
    #[arg(long)]
    pub no_perceptual: bool,

    /// Skip audio signatures
    #[arg(long)]
    pub no_acoustic: bool,
}

/// Execute the scan command.
pub async fn execute(args: ScanArgs, config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the path and try again.",
            args.input
        );
    }

    let config = apply_overrides(config, &args)?;
    let format = resolve_format(args.format, &config);
    let pretty = config.output.pretty;
    let dedup = Dedup::new(config)?;

    let input = args.input.clone();
    let category: Option<dupekit_core::Category> = args.category.map(Into::into);

    let report = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<DedupReport>> {
        let items = dedup.discover(&input, category);
        if items.is_empty() {
            tracing::warn!("No files found at {:?}", input);
            return Ok(None);
        }
        tracing::info!("Found {} file(s) to fingerprint", items.len());

        let progress = create_progress_bar(items.len() as u64);
        let tick = progress.clone();
        let report = dedup.run_with_progress(&items, move || tick.inc(1))?;
        progress.finish_and_clear();
        Ok(Some(report))
    })
    .await??;

    let Some(report) = report else {
        return Ok(());
    };

    write_report(&report, args.output.as_deref(), format, pretty)?;
    if let Some(path) = &args.output {
        tracing::info!("Report written to {:?}", path);
    }
    print_summary(&report.stats);

    Ok(())
}
