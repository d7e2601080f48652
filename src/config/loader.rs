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
/// 1. 环境变量（前缀 `TAILTALE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `TAILTALE_CLONING__URL=https://xxx.modal.run`
/// - `TAILTALE_CLONING__MAX_RETRIES=5`
/// - `TAILTALE_CAPTURE__MIN_DURATION_SECS=3`
/// - `TAILTALE_LOG__LEVEL=debug`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("cloning.url", "http://localhost:8000")?
        .set_default("cloning.timeout_secs", 120)?
        .set_default("cloning.max_retries", 3)?
        .set_default("cloning.retry_base_ms", 500)?
        .set_default("cloning.retry_max_ms", 8000)?
        .set_default("cloning.poll_interval_ms", 1000)?
        .set_default("cloning.processing_timeout_secs", 180)?
        .set_default("cloning.result_retention_secs", 300)?
        .set_default("cloning.max_upload_size", 10 * 1024 * 1024)?
        .set_default("cloning.exaggeration", 0.5)?
        .set_default("cloning.fake", false)?
        .set_default("capture.min_duration_secs", 5.0)?
        .set_default("capture.max_duration_secs", 15.0)?
        .set_default("playback.position_interval_ms", 250)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: TAILTALE_
    // 层级分隔符: __ (双下划线)
    // 例如: TAILTALE_CLONING__URL=https://xxx.modal.run
    builder = builder.add_source(
        Environment::with_prefix("TAILTALE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.cloning.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Cloning service URL cannot be empty".to_string(),
        ));
    }

    if config.cloning.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Poll interval cannot be 0".to_string(),
        ));
    }

    if config.cloning.retry_base_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Retry base cannot be 0".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.cloning.exaggeration) {
        return Err(ConfigError::ValidationError(
            "Exaggeration must be between 0.0 and 1.0".to_string(),
        ));
    }

    if config.capture.min_duration_secs <= 0.0 {
        return Err(ConfigError::ValidationError(
            "Minimum capture duration must be positive".to_string(),
        ));
    }

    if config.capture.max_duration_secs <= config.capture.min_duration_secs {
        return Err(ConfigError::ValidationError(
            "Maximum capture duration must exceed the minimum".to_string(),
        ));
    }

    if config.playback.position_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Position interval cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Cloning URL: {}", config.cloning.url);
    tracing::info!("Cloning Timeout: {}s", config.cloning.timeout_secs);
    tracing::info!("Cloning Max Retries: {}", config.cloning.max_retries);
    tracing::info!("Poll Interval: {}ms", config.cloning.poll_interval_ms);
    tracing::info!(
        "Processing Timeout: {}s",
        config.cloning.processing_timeout_secs
    );
    tracing::info!("Fake Cloning Client: {}", config.cloning.fake);
    tracing::info!(
        "Capture Duration: {}s - {}s",
        config.capture.min_duration_secs,
        config.capture.max_duration_secs
    );
    tracing::info!(
        "Position Interval: {}ms",
        config.playback.position_interval_ms
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_url() {
        let mut config = AppConfig::default();
        config.cloning.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_poll_interval() {
        let mut config = AppConfig::default();
        config.cloning.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_inverted_duration_bounds() {
        let mut config = AppConfig::default();
        config.capture.min_duration_secs = 20.0;
        config.capture.max_duration_secs = 15.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_out_of_range_exaggeration() {
        let mut config = AppConfig::default();
        config.cloning.exaggeration = 1.5;
        assert!(validate_config(&config).is_err());
    }
}
