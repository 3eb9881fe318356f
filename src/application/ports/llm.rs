//! LLM Port - 文本生成抽象
//!
//! 模型名由调用方传入，具体路由到哪个供应商由适配器决定

use async_trait::async_trait;
use thiserror::Error;

use crate::application::resilience::RetryDecision;

/// LLM 错误
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error (HTTP {status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response")]
    EmptyResponse,

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),
}

impl LlmError {
    /// 重试分类
    ///
    /// - 限流 / 5xx / 连接错误：指数退避重试
    /// - 空回复或无法解析：可能是瞬时问题，少量短间隔重试
    /// - 其余（4xx、配额耗尽、模型不支持）立即失败
    pub fn retry_decision(&self) -> RetryDecision {
        match self {
            LlmError::RateLimited(_) | LlmError::NetworkError(_) | LlmError::Timeout => {
                RetryDecision::Retry
            }
            LlmError::ServiceError { status, .. } if *status >= 500 => RetryDecision::Retry,
            LlmError::EmptyResponse | LlmError::InvalidResponse(_) => RetryDecision::RetryTransient,
            _ => RetryDecision::Fail,
        }
    }
}

/// 生成请求
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    /// 要求模型只输出 JSON
    pub json_output: bool,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            json_output: false,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// 生成结果
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    /// 实际处理请求的模型
    pub model: String,
}

/// LLM Port
#[async_trait]
pub trait LlmPort: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}
