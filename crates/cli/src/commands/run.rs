//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::ServiceBlueprint;
use config_loader::{ConfigLoader, ConfigSource, Overrides};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use user_service::Service;

use crate::cli::RunArgs;
use crate::error::CliError;

/// Resolve the blueprint from the config file (or defaults) and CLI overrides
///
/// Runs before logging is initialized, so it does not log.
pub fn prepare_blueprint(args: &RunArgs) -> Result<ServiceBlueprint> {
    let source = match &args.config {
        Some(path) if !path.exists() => {
            return Err(CliError::config_not_found(path.display().to_string()).into());
        }
        Some(path) => ConfigSource::File(path),
        None => ConfigSource::Defaults,
    };
    let overrides = Overrides {
        host: args.host.clone(),
        port: args.port,
        rate_per_sec: args.rate,
        burst: args.burst,
    };

    ConfigLoader::resolve(source, &overrides).with_context(|| match &args.config {
        Some(path) => format!("Invalid configuration in {}", path.display()),
        None => "Invalid configuration".to_string(),
    })
}

/// Execute the `run` command
pub async fn run_server(args: &RunArgs, blueprint: ServiceBlueprint) -> Result<()> {
    info!(
        host = %blueprint.server.host,
        port = blueprint.server.port,
        rate_per_sec = blueprint.rate_limit.rate_per_sec,
        burst = blueprint.rate_limit.burst,
        audit = ?blueprint.dispatch.audit.sink_type,
        notifications = ?blueprint.dispatch.notifications.sink_type,
        errors = ?blueprint.dispatch.errors.sink_type,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        println!("{}", ConfigLoader::to_toml(&blueprint)?);
        return Ok(());
    }

    let service = Service::build(&blueprint)
        .await
        .context("Failed to assemble service")?;

    let addr = format!("{}:{}", blueprint.server.host, blueprint.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| CliError::bind(&addr, e))?;
    info!(addr = %addr, "Listening");

    let Service {
        router,
        dispatchers,
        ..
    } = service;

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(CliError::Serve);

    // Handlers have finished; nothing submits past this point.
    info!("HTTP server stopped, draining dispatchers");
    let reports = dispatchers
        .shutdown(blueprint.dispatch.drain_timeout())
        .await;
    for report in &reports {
        if report.completed {
            info!(
                dispatcher = %report.dispatcher,
                written = report.written,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Dispatcher drained"
            );
        } else {
            warn!(
                dispatcher = %report.dispatcher,
                lost = report.pending,
                "Dispatcher drain incomplete"
            );
        }
    }

    served?;
    info!("usersvc stopped gracefully");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            host: None,
            port: None,
            rate: None,
            burst: None,
            dry_run: false,
        }
    }

    #[test]
    fn test_defaults_without_config() {
        let blueprint = prepare_blueprint(&args()).unwrap();
        assert_eq!(blueprint.server.port, 8080);
        assert_eq!(blueprint.rate_limit.burst, 5000);
    }

    #[test]
    fn test_overrides_applied_over_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 9000\n\n[rate_limit]\nburst = 10").unwrap();

        let blueprint = prepare_blueprint(&RunArgs {
            config: Some(file.path().to_path_buf()),
            port: Some(7000),
            rate: Some(5.0),
            ..args()
        })
        .unwrap();
        assert_eq!(blueprint.server.port, 7000);
        assert_eq!(blueprint.rate_limit.burst, 10);
        assert_eq!(blueprint.rate_limit.rate_per_sec, 5.0);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let result = prepare_blueprint(&RunArgs {
            burst: Some(0),
            ..args()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let err = prepare_blueprint(&RunArgs {
            config: Some("/nonexistent/usersvc.toml".into()),
            ..args()
        })
        .unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }
}
