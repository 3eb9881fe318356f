//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::workflows::TranslationSettings;
use crate::application::{RetryPolicy, WorkflowSettings};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM 配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// 文本向量化服务
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// 向量检索服务
    #[serde(default)]
    pub vector_search: VectorSearchConfig,

    /// 音效合成服务
    #[serde(default)]
    pub tts: TtsConfig,

    /// 音频对象存储
    #[serde(default)]
    pub storage: StorageConfig,

    /// 工作流参数
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 单个 LLM 提供方
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmProviderConfig {
    #[serde(default)]
    pub base_url: String,

    /// 为空时不启用该提供方
    #[serde(default)]
    pub api_key: Option<String>,
}

impl LlmProviderConfig {
    fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// LLM 配置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// 请求未指定 model 时使用
    #[serde(default = "default_llm_model")]
    pub default_model: String,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// 限流重试次数
    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,

    #[serde(default = "default_llm_delay")]
    pub base_delay_ms: u64,

    #[serde(default = "default_openai")]
    pub openai: LlmProviderConfig,

    #[serde(default = "default_gemini")]
    pub gemini: LlmProviderConfig,

    /// 使用脚本化的 fake 客户端（本地开发）
    #[serde(default)]
    pub fake: bool,
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_llm_retries() -> u32 {
    3
}

fn default_llm_delay() -> u64 {
    1000
}

fn default_openai() -> LlmProviderConfig {
    LlmProviderConfig::with_base_url("https://api.openai.com/v1")
}

fn default_gemini() -> LlmProviderConfig {
    LlmProviderConfig::with_base_url("https://generativelanguage.googleapis.com/v1beta")
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_llm_retries(),
            base_delay_ms: default_llm_delay(),
            openai: default_openai(),
            gemini: default_gemini(),
            fake: false,
        }
    }
}

impl LlmConfig {
    /// 限流重试策略；连接类错误另有两次快速重试
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
            .with_transient(2, Duration::from_millis(self.base_delay_ms / 4))
    }
}

/// 文本向量化服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_search_timeout() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            api_key: None,
            model: default_embedding_model(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// 向量检索服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct VectorSearchConfig {
    #[serde(default = "default_vector_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_music_collection")]
    pub music_collection: String,

    #[serde(default = "default_effect_collection")]
    pub effect_collection: String,

    /// 每次检索返回的候选数
    #[serde(default = "default_search_limit")]
    pub limit: usize,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_vector_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_music_collection() -> String {
    "background_music".to_string()
}

fn default_effect_collection() -> String {
    "sound_effects".to_string()
}

fn default_search_limit() -> usize {
    5
}

impl Default for VectorSearchConfig {
    fn default() -> Self {
        Self {
            url: default_vector_url(),
            api_key: None,
            music_collection: default_music_collection(),
            effect_collection: default_effect_collection(),
            limit: default_search_limit(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// 音效合成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 主服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// 主服务限流重试耗尽后切换到的备用服务
    #[serde(default)]
    pub fallback_url: Option<String>,

    #[serde(default)]
    pub fallback_api_key: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 最大重试次数
    #[serde(default = "default_tts_retries")]
    pub max_retries: u32,

    #[serde(default = "default_tts_delay")]
    pub base_delay_ms: u64,
}

fn default_tts_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

fn default_tts_retries() -> u32 {
    3
}

fn default_tts_delay() -> u64 {
    2000
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            api_key: None,
            fallback_url: None,
            fallback_api_key: None,
            timeout_secs: default_tts_timeout(),
            max_retries: default_tts_retries(),
            base_delay_ms: default_tts_delay(),
        }
    }
}

/// 对象存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// 写入本地目录
    #[default]
    Local,
    /// HTTP PUT 到对象存储
    Http,
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// local 后端的根目录
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,

    /// http 后端的服务地址
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default)]
    pub access_key: Option<String>,

    /// 返回给调用方的 URL 前缀
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// local 后端时由本服务在 `/objects` 下托管文件
    #[serde(default = "default_serve_local")]
    pub serve_local: bool,

    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("data/objects")
}

fn default_bucket() -> String {
    "storyloom".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8000/objects".to_string()
}

fn default_serve_local() -> bool {
    true
}

fn default_storage_timeout() -> u64 {
    60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_dir: default_local_dir(),
            endpoint: String::new(),
            bucket: default_bucket(),
            access_key: None,
            public_base_url: default_public_base_url(),
            serve_local: default_serve_local(),
            timeout_secs: default_storage_timeout(),
        }
    }
}

/// 工作流参数
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// 译文数量不符时的重试次数（不含首次）
    #[serde(default = "default_translation_retries")]
    pub translation_max_retries: u32,

    /// 全书字符数超过该值时改用分块翻译
    #[serde(default = "default_chunk_threshold")]
    pub translation_chunk_threshold_chars: usize,

    #[serde(default = "default_chunk_max")]
    pub translation_chunk_max_chars: usize,

    #[serde(default = "default_quiz_count")]
    pub quiz_default_count: usize,

    #[serde(default = "default_play_attempts")]
    pub play_max_attempts: u32,

    /// 单个音频生成的截止时间
    #[serde(default = "default_audio_timeout")]
    pub audio_timeout_secs: u64,

    #[serde(default = "default_audio_enabled")]
    pub audio_generation_enabled: bool,
}

fn default_translation_retries() -> u32 {
    TranslationSettings::default().max_retries
}

fn default_chunk_threshold() -> usize {
    TranslationSettings::default().chunk_threshold_chars
}

fn default_chunk_max() -> usize {
    TranslationSettings::default().chunk_max_chars
}

fn default_quiz_count() -> usize {
    5
}

fn default_play_attempts() -> u32 {
    3
}

fn default_audio_timeout() -> u64 {
    180
}

fn default_audio_enabled() -> bool {
    true
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            translation_max_retries: default_translation_retries(),
            translation_chunk_threshold_chars: default_chunk_threshold(),
            translation_chunk_max_chars: default_chunk_max(),
            quiz_default_count: default_quiz_count(),
            play_max_attempts: default_play_attempts(),
            audio_timeout_secs: default_audio_timeout(),
            audio_generation_enabled: default_audio_enabled(),
        }
    }
}

impl AppConfig {
    /// 组装工作流参数
    pub fn workflow_settings(&self) -> WorkflowSettings {
        let workflow = &self.workflow;
        WorkflowSettings {
            translation: TranslationSettings {
                max_retries: workflow.translation_max_retries,
                chunk_threshold_chars: workflow.translation_chunk_threshold_chars,
                chunk_max_chars: workflow.translation_chunk_max_chars,
            },
            quiz_default_count: workflow.quiz_default_count,
            play_max_attempts: workflow.play_max_attempts,
            audio_timeout: Duration::from_secs(workflow.audio_timeout_secs),
            audio_generation_enabled: workflow.audio_generation_enabled,
            music_collection: self.vector_search.music_collection.clone(),
            effect_collection: self.vector_search.effect_collection.clone(),
            search_limit: self.vector_search.limit,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "0.0.0.0:8000");
        assert_eq!(config.llm.default_model, "gpt-4o-mini");
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.workflow.audio_timeout_secs, 180);
        assert!(!config.llm.openai.is_enabled());
    }

    #[test]
    fn test_workflow_settings_mapping() {
        let mut config = AppConfig::default();
        config.workflow.translation_max_retries = 4;
        config.vector_search.limit = 8;

        let settings = config.workflow_settings();
        assert_eq!(settings.translation.max_retries, 4);
        assert_eq!(settings.search_limit, 8);
        assert_eq!(settings.audio_timeout, Duration::from_secs(180));
        assert_eq!(settings.music_collection, "background_music");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [llm.openai]
            api_key = "sk-test"

            [storage]
            backend = "http"
            endpoint = "https://objects.example.com"
            "#,
        )
        .unwrap();

        assert!(config.llm.openai.is_enabled());
        assert!(!config.llm.gemini.is_enabled());
        assert_eq!(config.storage.backend, StorageBackend::Http);
        assert_eq!(config.storage.bucket, "storyloom");
        assert_eq!(config.tts.max_retries, 3);
    }
}
