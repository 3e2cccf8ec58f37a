//! Bundle command - Assemble the fragment tree into one document.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use fragspec_core::{Assembler, Format};

use super::BaseDirArgs;

#[derive(Args)]
pub struct BundleArgs {
    #[command(flatten)]
    base: BaseDirArgs,

    /// Write the bundled spec to this file instead of stdout
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// Output YAML (default is JSON)
    #[arg(short, long)]
    yaml: bool,
}

pub fn execute(args: BundleArgs) -> Result<()> {
    let layout = args.base.layout()?;
    info!("Bundling spec from {:?}", layout.base_dir());

    let doc = Assembler::new(layout).bundle().context("Failed to bundle spec")?;
    let format = if args.yaml { Format::Yaml } else { Format::Json };
    let text = doc.render(format)?;

    match args.outfile {
        Some(path) => {
            fs::write(&path, text).with_context(|| format!("Failed to write {:?}", path))?;
            info!("Created {:?} spec file.", path);
        }
        None => print!("{}", text),
    }

    Ok(())
}
