//! TTS Engine Port - 音频合成引擎抽象
//!
//! 定义音频合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::application::resilience::RetryDecision;

/// TTS 错误
#[derive(Debug, Clone, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// 重试耗尽后仍被限流：调用方应切换到备用供应商
    #[error("Rate limit retries exhausted after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),
}

impl TtsError {
    /// 重试分类：限流重试，配额耗尽直接切换备用供应商
    pub fn retry_decision(&self) -> RetryDecision {
        match self {
            TtsError::RateLimited(_) | TtsError::NetworkError(_) | TtsError::Timeout => {
                RetryDecision::Retry
            }
            TtsError::QuotaExceeded(_) => RetryDecision::SwitchFallback,
            TtsError::InvalidResponse(_) => RetryDecision::RetryTransient,
            _ => RetryDecision::Fail,
        }
    }

    /// 是否应改用备用供应商
    pub fn should_switch_provider(&self) -> bool {
        matches!(
            self,
            TtsError::RateLimitExhausted { .. } | TtsError::QuotaExceeded(_)
        )
    }
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    /// 要合成的文本（语音）或声音描述（音效/音乐）
    pub text: String,
    /// 音色 ID；音效生成时为空
    pub voice: Option<String>,
    /// 期望时长（秒），适配器负责夹到供应商上限
    pub duration_secs: Option<f64>,
}

impl SpeechRequest {
    pub fn sound(text: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            text: text.into(),
            voice: None,
            duration_secs: Some(duration_secs),
        }
    }
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    /// 原始音频数据
    pub audio_data: Vec<u8>,
    /// MIME 类型
    pub content_type: String,
    /// 实际提供服务的供应商（用于日志）
    pub provider: String,
}

impl SpeechAudio {
    /// 按 MIME 类型推断文件扩展名
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            _ => "mp3",
        }
    }
}

/// TTS Engine Port
///
/// 外部音频合成服务的抽象接口
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 执行合成
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio, TtsError>;

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
