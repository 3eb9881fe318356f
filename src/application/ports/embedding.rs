//! Embedding Port - 文本向量化

use async_trait::async_trait;
use thiserror::Error;

use crate::application::resilience::RetryDecision;

#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Service error (HTTP {status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl EmbeddingError {
    pub fn retry_decision(&self) -> RetryDecision {
        match self {
            EmbeddingError::RateLimited(_) | EmbeddingError::NetworkError(_) => RetryDecision::Retry,
            EmbeddingError::ServiceError { status, .. } if *status >= 500 => RetryDecision::Retry,
            EmbeddingError::InvalidResponse(_) => RetryDecision::RetryTransient,
            _ => RetryDecision::Fail,
        }
    }
}

/// Embedding Port
#[async_trait]
pub trait EmbeddingPort: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
