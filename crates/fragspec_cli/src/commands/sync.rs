//! Sync command - Split a single document into the fragment tree.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use fragspec_core::Disassembler;

use super::BaseDirArgs;

#[derive(Args)]
pub struct SyncArgs {
    #[command(flatten)]
    base: BaseDirArgs,

    /// Single-file spec (JSON or YAML) to sync from
    spec: PathBuf,
}

pub fn execute(args: SyncArgs) -> Result<()> {
    let layout = args.base.layout()?;
    let text = fs::read_to_string(&args.spec)
        .with_context(|| format!("Failed to read {:?}", args.spec))?;

    let report = Disassembler::new(layout)
        .sync_text(&text)
        .with_context(|| format!("Failed to sync {:?}", args.spec))?;

    info!(
        "Synced paths ({} created, {} removed) and definitions ({} created, {} removed)",
        report.paths.create.len(),
        report.paths.delete.len(),
        report.definitions.create.len(),
        report.definitions.delete.len()
    );
    Ok(())
}
