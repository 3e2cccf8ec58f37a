//! Validate command - Bundle the spec and check its structure.

use anyhow::{Context, Result};
use clap::Args;
use thiserror::Error;
use tracing::info;

use fragspec_core::{Assembler, SpecValidator, StructuralValidator, ValidationIssue};

use super::BaseDirArgs;

/// Raised when the validator reports errors.
#[derive(Error, Debug)]
#[error("Validation failed with {0} error(s)")]
pub struct ValidationFailed(pub usize);

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    base: BaseDirArgs,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let layout = args.base.layout()?;
    info!("Validating spec in {:?}", layout.base_dir());

    let doc = Assembler::new(layout).bundle().context("Failed to bundle spec")?;
    let report = StructuralValidator.validate(&doc)?;

    if !report.warnings.is_empty() {
        eprintln!("Validation warnings:\n{}", render(&report.warnings)?);
    }

    if !report.is_valid() {
        eprintln!("Validation errors:\n{}", render(&report.errors)?);
        return Err(ValidationFailed(report.errors.len()).into());
    }

    info!("Spec is valid");
    Ok(())
}

fn render(issues: &[ValidationIssue]) -> Result<String> {
    Ok(serde_json::to_string_pretty(issues)?)
}
