//! List indexed files command

use crate::app::LsArgs;
use anyhow::Result;
use codequery_core::{Config, FileIndex, FsReader};

const LIST_LIMIT: usize = 50;

pub async fn run(args: LsArgs, config: &Config) -> Result<()> {
    let root = config.snapshot_dir();
    let reader = FsReader::new(&root);
    let index = FileIndex::build(&root, &reader, config.limits.preview_chars)?;

    let prefix = args.path.unwrap_or_default();
    let records = index.list_dir(&prefix);

    if records.is_empty() {
        println!("No files found under '{}'", prefix);
        return Ok(());
    }

    println!(
        "Files under '{}':",
        if prefix.is_empty() { "/" } else { prefix.as_str() }
    );
    for record in records.iter().take(LIST_LIMIT) {
        println!("  {} ({} lines)", record.path, record.line_count);
    }
    if records.len() > LIST_LIMIT {
        println!("  ... and {} more files", records.len() - LIST_LIMIT);
    }

    Ok(())
}
