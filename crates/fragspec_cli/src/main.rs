//! fragspec CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Configuration error (malformed fragment tree or layout)
//! - 3: Validation failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};
use fragspec_core::FragError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const CONFIGURATION_ERROR: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "fragspec=debug"
    } else if cli.quiet {
        "fragspec=warn"
    } else {
        "fragspec=info"
    };

    // Logs go to stderr, stdout is reserved for bundled documents.
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(level.parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Bundle(args) => commands::bundle::execute(args),
        Commands::Sync(args) => commands::sync::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<commands::validate::ValidationFailed>().is_some() {
        return ExitCodes::VALIDATION_FAILURE;
    }

    match e.downcast_ref::<FragError>() {
        Some(err) if err.is_configuration() => ExitCodes::CONFIGURATION_ERROR,
        _ => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_error() {
        let config: anyhow::Error = FragError::ReferenceCycle("#/headers/A".into()).into();
        assert_eq!(categorize_error(&config), ExitCodes::CONFIGURATION_ERROR);

        let wrapped = config.context("Failed to bundle spec");
        assert_eq!(categorize_error(&wrapped), ExitCodes::CONFIGURATION_ERROR);

        let validation: anyhow::Error = commands::validate::ValidationFailed(2).into();
        assert_eq!(categorize_error(&validation), ExitCodes::VALIDATION_FAILURE);

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(categorize_error(&other), ExitCodes::GENERAL_ERROR);
    }
}
