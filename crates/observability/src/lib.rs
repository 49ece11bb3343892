//! # Observability
//!
//! 可观测性模块：Tracing + HTTP 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - `HttpTelemetry`：独立的 Prometheus 注册表，按实例隔离
//! - `observe` 中间件：请求计数、错误计数、在途请求、延迟直方图
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{HttpTelemetry, observe};
//!
//! observability::init()?;
//!
//! let telemetry = Arc::new(HttpTelemetry::new()?);
//! let app = router.layer(axum::middleware::from_fn_with_state(telemetry, observe));
//! ```

pub mod metrics;
pub mod middleware;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use contracts::LogFormat;

// Re-exports
pub use crate::metrics::{find_sample, HttpTelemetry, InFlightGuard, TelemetryError};
pub use crate::middleware::{observe, TELEMETRY_PATH};

/// 初始化 Tracing (默认配置)
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// 默认日志级别 (RUST_LOG 优先)
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            default_log_level: "info".to_string(),
        }
    }
}

/// 使用自定义配置初始化 Tracing
///
/// 指标不在这里安装：每个 `HttpTelemetry` 持有自己的 recorder。
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    match config.log_format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer().pretty();

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer().compact();

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }

    tracing::info!(log_format = ?config.log_format, "Observability initialized");

    Ok(())
}
