//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// usersvc - user management HTTP service
#[derive(Parser, Debug)]
#[command(
    name = "usersvc",
    author,
    version,
    about = "User management HTTP service",
    long_about = "A user management HTTP service with token-bucket admission control,\n\
                  Prometheus request metrics, and asynchronous audit, notification \n\
                  and error dispatch drained on shutdown."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "USERSVC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (defaults to the config file, then pretty)
    #[arg(long, value_enum, global = true, env = "USERSVC_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "USERSVC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override listen address
    #[arg(long, env = "USERSVC_HOST")]
    pub host: Option<String>,

    /// Override listen port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Override admission rate (requests per second)
    #[arg(long, env = "USERSVC_RATE")]
    pub rate: Option<f64>,

    /// Override admission burst
    #[arg(long, env = "USERSVC_BURST")]
    pub burst: Option<u32>,

    /// Validate configuration and exit without serving
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "usersvc.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
