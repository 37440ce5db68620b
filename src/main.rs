use clap::Parser;
use tracing_subscriber::EnvFilter;

use scanscope::cli::{self, Commands};
use scanscope::errors::ScopeError;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .init();
    }

    let result = match cli.command {
        Commands::Serve(args) => cli::serve::handle_serve(args).await,
        Commands::Validate(args) => cli::check::handle_validate(args).await,
        Commands::Check(args) => cli::check::handle_check(args).await,
        Commands::Status(args) => cli::status::handle_status(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            ScopeError::Config(_) | ScopeError::Yaml(_) => 2,
            ScopeError::StoreUnavailable(_) => 3,
            ScopeError::Network(_) => 4,
            ScopeError::Validation(_) => 5,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}
