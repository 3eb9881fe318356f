//! Search Adapter - 向量化与向量检索

mod fakes;
mod http_embedding_client;
mod http_vector_search;

pub use fakes::{FakeEmbeddingClient, FakeVectorSearch};
pub use http_embedding_client::{HttpEmbeddingClient, HttpEmbeddingClientConfig};
pub use http_vector_search::{HttpVectorSearch, HttpVectorSearchConfig};
