//! LLM Adapter - 文本生成客户端实现

mod fake_llm_client;
mod gemini_client;
mod openai_client;
mod routed_llm_client;

pub use fake_llm_client::FakeLlmClient;
pub use gemini_client::{GeminiClient, GeminiClientConfig};
pub use openai_client::{OpenAiClient, OpenAiClientConfig};
pub use routed_llm_client::{LlmProvider, RoutedLlmClient};

use crate::application::ports::LlmError;

/// 非 2xx 状态码转错误
pub(crate) fn status_error(status: u16, body: String) -> LlmError {
    let lower = body.to_lowercase();
    match status {
        429 if lower.contains("insufficient_quota") || lower.contains("quota exceeded") => {
            LlmError::QuotaExceeded(body)
        }
        429 => LlmError::RateLimited(body),
        402 => LlmError::QuotaExceeded(body),
        _ => LlmError::ServiceError {
            status,
            message: body,
        },
    }
}

pub(crate) fn map_send_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::NetworkError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error(429, "Too many".into()), LlmError::RateLimited(_)));
        assert!(matches!(
            status_error(429, r#"{"error":{"code":"insufficient_quota"}}"#.into()),
            LlmError::QuotaExceeded(_)
        ));
        assert!(matches!(
            status_error(503, "down".into()),
            LlmError::ServiceError { status: 503, .. }
        ));
    }
}
