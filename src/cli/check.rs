use std::path::PathBuf;

use crate::cli::commands::{CheckArgs, ValidateArgs};
use crate::config::parse_config;
use crate::errors::ScopeError;
use crate::scope::TargetValidator;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), ScopeError> {
    let config = parse_config(&PathBuf::from(&args.config)).await?;
    println!("Configuration is valid: {}", args.config);
    println!(
        "  scope: {} allow, {} deny",
        config.allow_rules().len(),
        config.deny_rules().len()
    );
    println!(
        "  dispatch: timeout {}s, sweep every {}s",
        config.dispatch_timeout().as_secs(),
        config.sweep_interval().as_secs()
    );
    println!("  database: {}", config.database_path());
    Ok(())
}

/// Print whether `target` is in scope. An out-of-scope target is reported as a
/// validation error so the exit code reflects the answer.
pub async fn handle_check(args: CheckArgs) -> Result<(), ScopeError> {
    let config = parse_config(&PathBuf::from(&args.config)).await?;
    let validator = TargetValidator::from_config(&config)?;

    let target = validator.explain(&args.target)?;
    println!("{} is in scope", target);
    Ok(())
}
