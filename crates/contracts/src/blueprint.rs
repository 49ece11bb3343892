//! ServiceBlueprint - Config Loader 输出
//!
//! 描述完整的服务配置：监听地址、限流参数、三个分发器的 sink 路由、日志格式。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// 分发器默认队列容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的服务配置蓝图
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// HTTP 服务设置
    #[serde(default)]
    pub server: ServerConfig,

    /// 准入限流设置
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// 异步分发设置
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// 日志设置
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 单个请求的处理超时 (秒)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    15
}

/// 令牌桶限流配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// 稳态速率 R (tokens/s)
    #[serde(default = "default_rate_per_sec")]
    pub rate_per_sec: f64,

    /// 突发容量 B (最多可积攒的令牌数)
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl RateLimitConfig {
    pub fn new(rate_per_sec: f64, burst: u32) -> Self {
        Self {
            rate_per_sec,
            burst,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate_per_sec: default_rate_per_sec(),
            burst: default_burst(),
        }
    }
}

fn default_rate_per_sec() -> f64 {
    1000.0
}

fn default_burst() -> u32 {
    5000
}

/// 分发器配置 (审计 / 通知 / 错误记录)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// 关闭时排空队列的最长等待 (秒)
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,

    /// 审计日志分发器
    #[serde(default = "default_audit_sink")]
    pub audit: SinkConfig,

    /// 用户通知分发器
    #[serde(default = "default_notification_sink")]
    pub notifications: SinkConfig,

    /// 错误记录分发器
    #[serde(default = "default_error_sink")]
    pub errors: SinkConfig,
}

impl DispatchConfig {
    /// Drain timeout as a `Duration`
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: default_drain_timeout_secs(),
            audit: default_audit_sink(),
            notifications: default_notification_sink(),
            errors: default_error_sink(),
        }
    }
}

fn default_drain_timeout_secs() -> u64 {
    30
}

fn default_audit_sink() -> SinkConfig {
    SinkConfig::new("audit", SinkType::Stdout)
}

fn default_notification_sink() -> SinkConfig {
    SinkConfig::new("notifications", SinkType::Stdout)
}

fn default_error_sink() -> SinkConfig {
    SinkConfig::new("errors", SinkType::Stderr)
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数 (file: `path`)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    pub fn new(name: impl Into<String>, sink_type: SinkType) -> Self {
        Self {
            name: name.into(),
            sink_type,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            params: HashMap::new(),
        }
    }
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// tracing 日志输出
    Log,
    /// 进程标准输出
    Stdout,
    /// 进程标准错误
    Stderr,
    /// 追加写文件
    File,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// 日志格式
    #[serde(default)]
    pub log_format: LogFormat,

    /// 默认日志级别 (RUST_LOG 优先)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON 结构化日志
    Json,
    /// 人类可读格式
    #[default]
    Pretty,
    /// 紧凑单行格式
    Compact,
}
