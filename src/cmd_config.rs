//! `check-config` subcommand.

use std::path::Path;
use std::process::ExitCode;

use skillstar_config::{Config, ConfigValidator};

/// Print validation findings; non-zero exit when there are errors.
pub(crate) fn check(path: &Path, config: &Config) -> ExitCode {
    let result = ConfigValidator::validate(config);

    if path.exists() {
        println!("Configuration: {}", path.display());
    } else {
        println!("Configuration: {} (not found, using defaults)", path.display());
    }

    for warning in &result.warnings {
        println!("  warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("  error:   {}: {}", error.path, error.message);
    }

    if result.is_valid() {
        println!("OK");
        ExitCode::SUCCESS
    } else {
        println!("{} error(s)", result.errors.len());
        ExitCode::FAILURE
    }
}
