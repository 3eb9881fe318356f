//! Vector Search Port - 向量相似度检索

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::application::resilience::RetryDecision;

#[derive(Debug, Clone, Error)]
pub enum VectorSearchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Service error (HTTP {status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl VectorSearchError {
    pub fn retry_decision(&self) -> RetryDecision {
        match self {
            VectorSearchError::NetworkError(_) => RetryDecision::Retry,
            VectorSearchError::ServiceError { status, .. } if *status == 429 || *status >= 500 => {
                RetryDecision::Retry
            }
            _ => RetryDecision::Fail,
        }
    }
}

/// 检索请求
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub collection: String,
    pub vector: Vec<f32>,
    pub limit: usize,
    /// 需要返回的 payload 字段，空表示全部
    pub payload_fields: Vec<String>,
}

/// 检索命中，按相似度降序
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub score: f32,
    pub payload: Map<String, Value>,
}

impl SearchHit {
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// Vector Search Port
#[async_trait]
pub trait VectorSearchPort: Send + Sync {
    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchHit>, VectorSearchError>;
}
