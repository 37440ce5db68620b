use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(name = "scanscope", version, about = "Rescan coordination and scan result index for a scanning fleet")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server and the stale dispatch sweeper
    Serve(ServeArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
    /// Check whether a target is in scope
    Check(CheckArgs),
    /// Show pending and dispatched tasks of a running server
    Status(StatusArgs),
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// SQLite database path (overrides the config file)
    #[arg(long)]
    pub db: Option<String>,

    /// Listen address
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(long, default_value = "8080")]
    pub port: u16,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: String,
}

#[derive(Args, Clone)]
pub struct CheckArgs {
    /// Config file holding the scope rules
    pub config: String,

    /// IP address or hostname to check
    pub target: String,
}

#[derive(Args, Clone)]
pub struct StatusArgs {
    /// Base URL of the running server
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Keep polling
    #[arg(long)]
    pub follow: bool,

    /// Poll interval in seconds
    #[arg(long, default_value = "10")]
    pub interval: u64,
}
