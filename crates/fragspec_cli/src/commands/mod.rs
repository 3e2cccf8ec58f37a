//! CLI command definitions.
//!
//! Each subcommand maps to one operation on a fragment tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use fragspec_core::RepoLayout;

pub mod bundle;
pub mod sync;
pub mod validate;

/// fragspec - keep an API specification as a tree of fragment files
#[derive(Parser)]
#[command(name = "fragspec")]
#[command(version, about = "Bundle and sync API specifications kept as fragment trees")]
#[command(long_about = r#"
fragspec keeps a Swagger/OpenAPI specification as a directory of small files
(one per path, one per definition, one per code sample) and assembles it into
a single document on demand.

WORKFLOWS:
  bundle    → Assemble the fragment tree into one JSON or YAML document
  sync      → Split a single document back into the fragment tree
  validate  → Bundle and run structural validation

EXIT CODES:
  0 - Success
  1 - General error
  2 - Configuration error
  3 - Validation failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bundle a multi-file spec into a single document
    Bundle(bundle::BundleArgs),

    /// Sync a single-file spec into the fragment tree
    #[command(name = "sync", alias = "sync-with-swagger")]
    Sync(sync::SyncArgs),

    /// Validate the bundled spec
    Validate(validate::ValidateArgs),
}

/// Base directory option shared by every command.
#[derive(Args, Debug, Clone)]
pub struct BaseDirArgs {
    /// Directory holding the root document and fragment trees
    #[arg(short, long = "basedir", env = "FRAGSPEC_BASEDIR", default_value = "spec")]
    pub basedir: PathBuf,
}

impl BaseDirArgs {
    /// Resolve the layout, honouring a `fragspec.toml` in the base directory.
    pub fn layout(&self) -> Result<RepoLayout> {
        RepoLayout::load(&self.basedir)
            .with_context(|| format!("Failed to load layout for {:?}", self.basedir))
    }
}
