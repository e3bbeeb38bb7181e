//! Fetch snapshot command

use crate::app::FetchArgs;
use anyhow::Result;
use codequery_core::{Config, SnapshotFetcher, SnapshotSource};

pub async fn run(args: FetchArgs, config: &Config) -> Result<()> {
    let source = SnapshotSource::parse(&args.source)?.with_subdir(args.target);
    let dest = config.snapshot_dir();

    let fetcher = SnapshotFetcher::new();
    let count = fetcher.fetch(&source, &dest).await?;

    println!("Fetched {} files into {}", count, dest.display());
    Ok(())
}
