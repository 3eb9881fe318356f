//! Qdrant 风格的向量检索客户端
//!
//! POST {url}/collections/{collection}/points/search

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::ports::{SearchHit, SearchQuery, VectorSearchError, VectorSearchPort};
use crate::application::resilience::{retry_with_backoff, RetryPolicy};

#[derive(Debug, Clone)]
pub struct HttpVectorSearchConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HttpVectorSearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: Value,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

fn payload_selector(fields: &[String]) -> Value {
    if fields.is_empty() {
        Value::Bool(true)
    } else {
        Value::from(fields.to_vec())
    }
}

pub struct HttpVectorSearch {
    client: Client,
    config: HttpVectorSearchConfig,
    policy: RetryPolicy,
}

impl HttpVectorSearch {
    pub fn new(config: HttpVectorSearchConfig, policy: RetryPolicy) -> Result<Self, VectorSearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VectorSearchError::NetworkError(e.to_string()))?;
        Ok(Self {
            client,
            config,
            policy,
        })
    }

    fn search_url(&self, collection: &str) -> String {
        format!(
            "{}/collections/{}/points/search",
            self.config.url.trim_end_matches('/'),
            collection
        )
    }

    async fn search_once(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, VectorSearchError> {
        let body = SearchRequest {
            vector: &query.vector,
            limit: query.limit,
            with_payload: payload_selector(&query.payload_fields),
        };
        let mut builder = self.client.post(self.search_url(&query.collection)).json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("api-key", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| VectorSearchError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(VectorSearchError::CollectionNotFound(query.collection.clone()));
        }
        if !status.is_success() {
            return Err(VectorSearchError::ServiceError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| VectorSearchError::InvalidResponse(e.to_string()))?;

        let mut hits: Vec<SearchHit> = parsed
            .result
            .into_iter()
            .map(|p| SearchHit {
                score: p.score,
                payload: p.payload.unwrap_or_default(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(hits)
    }
}

#[async_trait]
impl VectorSearchPort for HttpVectorSearch {
    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchHit>, VectorSearchError> {
        let hits = retry_with_backoff(&self.policy, "vector_search", VectorSearchError::retry_decision, |_| {
            self.search_once(&query)
        })
        .await
        .map_err(|e| e.into_last_error())?;

        tracing::debug!(collection = %query.collection, hits = hits.len(), "Vector search completed");
        Ok(hits)
    }
}
