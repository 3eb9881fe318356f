//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, StorageBackend};

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
/// # 环境变量示例
/// - `STORYLOOM_SERVER__PORT=8080`
/// - `STORYLOOM_LLM__DEFAULT_MODEL=gemini-1.5-flash`
/// - `STORYLOOM_LLM__OPENAI__API_KEY=sk-...`
/// - `STORYLOOM_STORAGE__BACKEND=http`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// `config_path` 为 None 时按 `CONFIG_FILE_NAMES` 搜索当前目录
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值；嵌套的提供方地址需要显式给出，否则只设置 api_key 时会被整体覆盖
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("llm.default_model", "gpt-4o-mini")?
        .set_default("llm.openai.base_url", "https://api.openai.com/v1")?
        .set_default(
            "llm.gemini.base_url",
            "https://generativelanguage.googleapis.com/v1beta",
        )?
        .set_default("storage.backend", "local")?
        .set_default("workflow.audio_timeout_secs", 180)?
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

    // 3. 环境变量，例如 STORYLOOM_TTS__URL=https://tts.internal
    builder = builder.add_source(
        Environment::with_prefix("STORYLOOM")
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

    if config.llm.default_model.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "LLM default model cannot be empty".to_string(),
        ));
    }

    if config.workflow.audio_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Audio timeout cannot be 0".to_string(),
        ));
    }

    if config.workflow.translation_max_retries == 0 {
        return Err(ConfigError::ValidationError(
            "Translation max retries cannot be 0".to_string(),
        ));
    }

    if config.workflow.play_max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "Play max attempts cannot be 0".to_string(),
        ));
    }

    if config.storage.backend == StorageBackend::Http && config.storage.endpoint.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Storage endpoint is required for the http backend".to_string(),
        ));
    }

    Ok(())
}

fn configured(key: &Option<String>) -> &'static str {
    match key.as_deref() {
        Some(k) if !k.trim().is_empty() => "configured",
        _ => "missing",
    }
}

/// 打印配置信息（用于启动时日志，不输出密钥）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("LLM Default Model: {}", config.llm.default_model);
    if config.llm.fake {
        tracing::warn!("LLM: using scripted fake client");
    } else {
        tracing::info!("OpenAI: {} ({})", config.llm.openai.base_url, configured(&config.llm.openai.api_key));
        tracing::info!("Gemini: {} ({})", config.llm.gemini.base_url, configured(&config.llm.gemini.api_key));
    }
    tracing::info!("Embedding: {} / {}", config.embedding.url, config.embedding.model);
    tracing::info!(
        "Vector Search: {} [{}, {}]",
        config.vector_search.url,
        config.vector_search.music_collection,
        config.vector_search.effect_collection
    );
    tracing::info!("TTS: {} ({})", config.tts.url, configured(&config.tts.api_key));
    if let Some(fallback) = &config.tts.fallback_url {
        tracing::info!("TTS Fallback: {}", fallback);
    }
    tracing::info!("Storage Backend: {:?}", config.storage.backend);
    tracing::info!("Audio Generation: {}", config.workflow.audio_generation_enabled);
    tracing::info!("Audio Timeout: {}s", config.workflow.audio_timeout_secs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_model() {
        let mut config = AppConfig::default();
        config.llm.default_model = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_workflow_limits() {
        let mut config = AppConfig::default();
        config.workflow.audio_timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.workflow.translation_max_retries = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_http_storage_requires_endpoint() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Http;
        assert!(validate_config(&config).is_err());

        config.storage.endpoint = "https://objects.example.com".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [server]
            port = 9100

            [llm]
            default_model = "gemini-1.5-flash"

            [llm.gemini]
            api_key = "g-key"

            [workflow]
            quiz_default_count = 7
            "#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.llm.default_model, "gemini-1.5-flash");
        assert!(config.llm.gemini.is_enabled());
        assert_eq!(
            config.llm.gemini.base_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.workflow.quiz_default_count, 7);
        assert_eq!(config.workflow.audio_timeout_secs, 180);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[workflow]\naudio_timeout_secs = 0").unwrap();

        let result = load_config_from_path(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
