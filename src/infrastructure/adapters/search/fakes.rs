//! 检索相关的 Fake 实现（测试 / 本地开发）

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::application::ports::{
    EmbeddingError, EmbeddingPort, SearchHit, SearchQuery, VectorSearchError, VectorSearchPort,
};

/// 由文本内容确定的伪向量
pub struct FakeEmbeddingClient {
    dimensions: usize,
}

impl FakeEmbeddingClient {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

#[async_trait]
impl EmbeddingPort for FakeEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let digest = md5::compute(text.as_bytes());
        Ok((0..self.dimensions)
            .map(|i| f32::from(digest.0[i % 16]) / 255.0)
            .collect())
    }
}

/// 按集合返回预设命中，记录收到的查询
#[derive(Default)]
pub struct FakeVectorSearch {
    hits: Vec<(String, SearchHit)>,
    queries: Mutex<Vec<SearchQuery>>,
}

impl FakeVectorSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hit(mut self, collection: &str, score: f32, path: &str, description: &str) -> Self {
        let mut payload = Map::new();
        payload.insert("path".to_string(), Value::from(path));
        payload.insert("description".to_string(), Value::from(description));
        self.hits.push((collection.to_string(), SearchHit { score, payload }));
        self
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VectorSearchPort for FakeVectorSearch {
    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchHit>, VectorSearchError> {
        let mut hits: Vec<SearchHit> = self
            .hits
            .iter()
            .filter(|(collection, _)| *collection == query.collection)
            .map(|(_, hit)| hit.clone())
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.limit);

        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query);
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_embedding_is_deterministic() {
        let client = FakeEmbeddingClient::new(8);
        let a = client.embed("rain").await.unwrap();
        assert_eq!(a.len(), 8);
        assert_eq!(a, client.embed("rain").await.unwrap());
        assert_ne!(a, client.embed("thunder").await.unwrap());
    }

    #[tokio::test]
    async fn test_fake_search_filters_and_orders() {
        let search = FakeVectorSearch::new()
            .with_hit("music", 0.2, "a.mp3", "")
            .with_hit("music", 0.9, "b.mp3", "")
            .with_hit("effects", 0.5, "c.wav", "");
        let hits = search
            .search(SearchQuery {
                collection: "music".into(),
                vector: vec![0.0],
                limit: 5,
                payload_fields: vec![],
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload_str("path"), Some("b.mp3"));
        assert_eq!(search.queries().len(), 1);
    }
}
