//! # Config Loader
//!
//! 服务配置解析。
//!
//! 配置按固定顺序得出：来源 (默认值 / 文件 / 内联文本) → 命令行覆盖项 → 校验。
//! 校验总在覆盖之后执行，因此 `--burst 0` 与文件里的 `burst = 0` 一样会被拒绝。
//!
//! ```no_run
//! use config_loader::{ConfigLoader, ConfigSource, Overrides};
//! use std::path::Path;
//!
//! let overrides = Overrides { port: Some(9000), ..Default::default() };
//! let blueprint =
//!     ConfigLoader::resolve(ConfigSource::File(Path::new("usersvc.toml")), &overrides).unwrap();
//! println!("listening on {}", blueprint.server.port);
//! ```

mod validator;

pub use contracts::ServiceBlueprint;

use contracts::ContractError;
use std::path::Path;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// 按扩展名识别 (大小写不敏感)
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ContractError::config_parse("config file has no extension"))?;
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(ContractError::config_parse(format!(
                "unsupported config format: .{other}"
            ))),
        }
    }

    fn parse(self, content: &str) -> Result<ServiceBlueprint, ContractError> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| ContractError::ConfigParse {
                message: format!("TOML parse error: {e}"),
                source: Some(Box::new(e)),
            }),
            Self::Json => serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
                message: format!("JSON parse error: {e}"),
                source: Some(Box::new(e)),
            }),
        }
    }
}

/// 配置来源
#[derive(Debug, Clone, Copy)]
pub enum ConfigSource<'a> {
    /// 不读文件，全部使用默认值
    Defaults,
    /// 配置文件，格式由扩展名决定
    File(&'a Path),
    /// 内联文本
    Inline(&'a str, ConfigFormat),
}

/// 命令行 / 环境变量覆盖项，`None` 表示保留来源中的值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub rate_per_sec: Option<f64>,
    pub burst: Option<u32>,
}

impl Overrides {
    pub fn apply(&self, blueprint: &mut ServiceBlueprint) {
        if let Some(host) = &self.host {
            blueprint.server.host = host.clone();
        }
        if let Some(port) = self.port {
            blueprint.server.port = port;
        }
        if let Some(rate) = self.rate_per_sec {
            blueprint.rate_limit.rate_per_sec = rate;
        }
        if let Some(burst) = self.burst {
            blueprint.rate_limit.burst = burst;
        }
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read the source, apply overrides, then validate the result
    ///
    /// # Errors
    /// Read, format, parse or validation failure; validation errors name the
    /// offending field (e.g. `dispatch.errors.params.path`).
    pub fn resolve(
        source: ConfigSource<'_>,
        overrides: &Overrides,
    ) -> Result<ServiceBlueprint, ContractError> {
        let mut blueprint = match source {
            ConfigSource::Defaults => ServiceBlueprint::default(),
            ConfigSource::File(path) => {
                let format = ConfigFormat::from_path(path)?;
                format.parse(&std::fs::read_to_string(path)?)?
            }
            ConfigSource::Inline(content, format) => format.parse(content)?,
        };
        overrides.apply(&mut blueprint);
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Load and validate a config file as written
    pub fn load_from_path(path: &Path) -> Result<ServiceBlueprint, ContractError> {
        Self::resolve(ConfigSource::File(path), &Overrides::default())
    }

    /// Load and validate inline config text
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ServiceBlueprint, ContractError> {
        Self::resolve(ConfigSource::Inline(content, format), &Overrides::default())
    }

    /// Effective configuration as TOML (printed by `usersvc run --dry-run`)
    pub fn to_toml(blueprint: &ServiceBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }
}
