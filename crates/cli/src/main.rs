//! # usersvc
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - HTTP 服务启动
//! - 优雅关闭与分发器排空

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use contracts::TelemetryConfig;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{prepare_blueprint, run_server, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logging settings may come from the config file, so `run` loads it first.
    let result = match &cli.command {
        Commands::Run(args) => {
            let blueprint = prepare_blueprint(args);
            init_logging(&cli, blueprint.as_ref().ok().map(|bp| &bp.telemetry))?;
            log_start();
            match blueprint {
                Ok(blueprint) => run_server(args, blueprint).await,
                Err(e) => Err(e),
            }
        }
        Commands::Validate(args) => {
            init_logging(&cli, None)?;
            log_start();
            run_validate(args)
        }
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

fn log_start() {
    info!(version = env!("CARGO_PKG_VERSION"), "usersvc starting");
}

/// Initialize logging
///
/// Format: `--log-format`, then the config file, then pretty.
/// Level: `-q` / `-v` flags, then the config file, then info. `RUST_LOG`
/// overrides the level when set.
fn init_logging(cli: &Cli, file: Option<&TelemetryConfig>) -> Result<()> {
    let log_format = cli
        .log_format
        .map(contracts::LogFormat::from)
        .or(file.map(|t| t.log_format))
        .unwrap_or_default();

    let default_log_level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => file
                .map(|t| t.log_level.clone())
                .unwrap_or_else(|| "info".to_string()),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    observability::init_with_config(ObservabilityConfig {
        log_format,
        default_log_level,
    })
}
