//! The `dupekit match` command: everything under a path that duplicates one file.

use clap::Args;
use dupekit_core::{output, Category, Config, Dedup, Item, MetadataExtractor};
use std::path::PathBuf;

/// Arguments for the `match` command.
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// File to look for
    pub file: PathBuf,

    /// File or directory to search
    pub path: PathBuf,

    /// Return at most this many matches
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Execute the match command.
pub async fn execute(args: MatchArgs, config: Config) -> anyhow::Result<()> {
    if !args.file.is_file() {
        anyhow::bail!("Not a file: {:?}", args.file);
    }
    if !args.path.exists() {
        anyhow::bail!("Search path does not exist: {:?}", args.path);
    }

    let pretty = config.output.pretty;
    let dedup = Dedup::new(config)?;
    let source = MetadataExtractor::enrich(Item::from_path(
        &args.file,
        Category::infer(&args.file),
    ));

    let matches = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let candidates: Vec<Item> = dedup
            .discover(&args.path, None)
            .into_iter()
            .filter(|item| item.id != source.id)
            .collect();
        tracing::info!("Comparing against {} candidate(s)", candidates.len());
        Ok(dedup.find_matches(&source, &candidates, args.limit)?)
    })
    .await??;

    println!("{}", output::to_json(&matches, pretty)?);
    tracing::info!("{} match(es)", matches.len());
    Ok(())
}
