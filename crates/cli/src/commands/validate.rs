//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ServiceBlueprint, SinkConfig, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Queues smaller than this overflow on modest bursts
const SMALL_QUEUE: usize = 100;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    listen: String,
    rate_per_sec: f64,
    burst: u32,
    drain_timeout_secs: u64,
    dispatchers: Vec<DispatcherSummary>,
}

#[derive(Serialize)]
struct DispatcherSummary {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&blueprint)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn sinks(blueprint: &ServiceBlueprint) -> [&SinkConfig; 3] {
    let dispatch = &blueprint.dispatch;
    [&dispatch.audit, &dispatch.notifications, &dispatch.errors]
}

fn summarize(blueprint: &ServiceBlueprint) -> ConfigSummary {
    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        listen: format!("{}:{}", blueprint.server.host, blueprint.server.port),
        rate_per_sec: blueprint.rate_limit.rate_per_sec,
        burst: blueprint.rate_limit.burst,
        drain_timeout_secs: blueprint.dispatch.drain_timeout_secs,
        dispatchers: sinks(blueprint)
            .into_iter()
            .map(|sink| DispatcherSummary {
                name: sink.name.clone(),
                sink_type: format!("{:?}", sink.sink_type),
                queue_capacity: sink.queue_capacity,
            })
            .collect(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ServiceBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    for sink in sinks(blueprint) {
        if sink.queue_capacity < SMALL_QUEUE {
            warnings.push(format!(
                "Dispatcher '{}' has a small queue ({}) - bursts will go to the overflow sink",
                sink.name, sink.queue_capacity
            ));
        }
    }

    let file_paths: Vec<&String> = sinks(blueprint)
        .into_iter()
        .filter(|sink| sink.sink_type == SinkType::File)
        .filter_map(|sink| sink.params.get("path"))
        .collect();
    for (i, path) in file_paths.iter().enumerate() {
        if file_paths[..i].contains(path) {
            warnings.push(format!("Several dispatchers append to the same file: {path}"));
        }
    }

    if f64::from(blueprint.rate_limit.burst) < blueprint.rate_limit.rate_per_sec {
        warnings.push(
            "rate_limit.burst is below one second of traffic at rate_per_sec".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Listen: {}", summary.listen);
            println!(
                "  Rate limit: {} req/s, burst {}",
                summary.rate_per_sec, summary.burst
            );
            println!("  Drain timeout: {}s", summary.drain_timeout_secs);
            for dispatcher in &summary.dispatchers {
                println!(
                    "  Dispatcher {}: {} (capacity {})",
                    dispatcher.name, dispatcher.sink_type, dispatcher.queue_capacity
                );
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
