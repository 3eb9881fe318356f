//! OpenAI 兼容的 Embeddings 客户端
//!
//! POST {url}/embeddings  {"model": "...", "input": "..."}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{EmbeddingError, EmbeddingPort};
use crate::application::resilience::{retry_with_backoff, RetryPolicy};

#[derive(Debug, Clone)]
pub struct HttpEmbeddingClientConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for HttpEmbeddingClientConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct HttpEmbeddingClient {
    client: Client,
    config: HttpEmbeddingClientConfig,
    policy: RetryPolicy,
}

impl HttpEmbeddingClient {
    pub fn new(config: HttpEmbeddingClientConfig, policy: RetryPolicy) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::NetworkError(e.to_string()))?;
        Ok(Self {
            client,
            config,
            policy,
        })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.url.trim_end_matches('/'))
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut builder = self.client.post(self.embeddings_url()).json(&EmbeddingRequest {
            model: &self.config.model,
            input: text,
        });
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| EmbeddingError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(if status.as_u16() == 429 {
                EmbeddingError::RateLimited(message)
            } else {
                EmbeddingError::ServiceError {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".to_string()))
    }
}

#[async_trait]
impl EmbeddingPort for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        retry_with_backoff(&self.policy, "embedding", EmbeddingError::retry_decision, |_| {
            self.embed_once(text)
        })
        .await
        .map_err(|e| e.into_last_error())
    }
}
