//! 配置校验模块
//!
//! 校验规则：
//! - rate_per_sec > 0 且有限, burst >= 1
//! - 每个分发器 queue_capacity >= 1, name 非空
//! - file sink 必须提供 `path` 参数
//! - 1 <= drain_timeout_secs <= 3600, 1 <= request_timeout_secs <= 3600

use contracts::{ContractError, ServiceBlueprint, SinkConfig, SinkType};

/// 超时上限 (秒)，超过即视为配置错误
const MAX_TIMEOUT_SECS: u64 = 3600;

/// 校验 ServiceBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    validate_server(blueprint)?;
    validate_rate_limit(blueprint)?;
    validate_dispatch(blueprint)?;
    Ok(())
}

/// 校验 HTTP 服务配置
fn validate_server(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    if blueprint.server.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "server.host",
            "host cannot be empty",
        ));
    }
    check_timeout(
        "server.request_timeout_secs",
        blueprint.server.request_timeout_secs,
    )?;
    Ok(())
}

/// 校验令牌桶参数
fn validate_rate_limit(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let rate = blueprint.rate_limit.rate_per_sec;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ContractError::config_validation(
            "rate_limit.rate_per_sec",
            format!("rate_per_sec must be a positive number, got {rate}"),
        ));
    }
    if blueprint.rate_limit.burst == 0 {
        return Err(ContractError::config_validation(
            "rate_limit.burst",
            "burst must be >= 1",
        ));
    }
    Ok(())
}

/// 校验分发器配置
fn validate_dispatch(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let dispatch = &blueprint.dispatch;
    check_timeout("dispatch.drain_timeout_secs", dispatch.drain_timeout_secs)?;

    validate_sink("dispatch.audit", &dispatch.audit)?;
    validate_sink("dispatch.notifications", &dispatch.notifications)?;
    validate_sink("dispatch.errors", &dispatch.errors)?;
    Ok(())
}

fn check_timeout(field: &str, secs: u64) -> Result<(), ContractError> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
        return Err(ContractError::config_validation(
            field,
            format!("must be between 1 and {MAX_TIMEOUT_SECS} seconds, got {secs}"),
        ));
    }
    Ok(())
}

/// 校验单个 sink 配置
fn validate_sink(field: &str, sink: &SinkConfig) -> Result<(), ContractError> {
    if sink.name.is_empty() {
        return Err(ContractError::config_validation(
            format!("{field}.name"),
            "sink name cannot be empty",
        ));
    }
    if sink.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            format!("{field}.queue_capacity"),
            "queue_capacity must be >= 1",
        ));
    }
    if sink.sink_type == SinkType::File && !sink.params.contains_key("path") {
        return Err(ContractError::config_validation(
            format!("{field}.params.path"),
            "file sink requires a 'path' parameter",
        ));
    }
    Ok(())
}
