//! The `dupekit hash` command: print one file's fingerprint.

use clap::Args;
use dupekit_core::{output, Category as CoreCategory, Config, Dedup, Item};
use std::path::PathBuf;

use super::scan::Category;

/// Arguments for the `hash` command.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to fingerprint
    pub file: PathBuf,

    /// Category to fingerprint as (guessed from the extension by default)
    #[arg(long, value_enum)]
    pub category: Option<Category>,
}

/// Execute the hash command.
pub async fn execute(args: HashArgs, config: Config) -> anyhow::Result<()> {
    let category: CoreCategory = args
        .category
        .map(Into::into)
        .unwrap_or_else(|| CoreCategory::infer(&args.file));
    let pretty = config.output.pretty;
    let dedup = Dedup::new(config)?;
    let item = Item::from_path(&args.file, category);

    let fingerprint = tokio::task::spawn_blocking(move || dedup.fingerprint(&item)).await??;

    for degradation in &fingerprint.degradations {
        tracing::warn!("{:?} unavailable: {}", degradation.channel, degradation.reason);
    }
    println!("{}", output::to_json(&fingerprint, pretty)?);
    Ok(())
}
