//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `DISCOVERR_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `DISCOVERR_SERVER__PORT=8080`
/// - `DISCOVERR_LIDARR__URL=http://lidarr:8686`
/// - `DISCOVERR_LASTFM__API_KEY=...`
/// - `DISCOVERR_DISCOVERY__BATCH_SIZE=20`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5000)?
        .set_default("discovery.batch_size", 10)?
        .set_default("discovery.candidate_cap", 500)?
        .set_default("database.path", "data/discoverr.db")?
        .set_default("database.max_connections", 5)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: DISCOVERR_LIDARR__API_KEY=xxxx
    builder = builder.add_source(
        Environment::with_prefix("DISCOVERR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.discovery.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "Discovery batch size must be at least 1".to_string(),
        ));
    }

    if config.discovery.candidate_cap == 0 {
        return Err(ConfigError::ValidationError(
            "Discovery candidate cap must be at least 1".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志），不输出任何 key
pub fn print_config(config: &AppConfig) {
    let flag = |on: bool| if on { "configured" } else { "not configured" };

    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("Lidarr URL: {}", config.lidarr.url);
    tracing::info!("Lidarr Dry Run: {}", config.lidarr.dry_run);
    tracing::info!("Last.fm: {}", flag(config.lastfm.is_configured()));
    tracing::info!(
        "LLM: {} (model {})",
        flag(config.llm.is_configured()),
        config.llm.model
    );
    tracing::info!("YouTube: {}", flag(config.youtube.is_configured()));
    tracing::info!("Batch Size: {}", config.discovery.batch_size);
    tracing::info!("Candidate Cap: {}", config.discovery.candidate_cap);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Users: {}", config.users.len());
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
