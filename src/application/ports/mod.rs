//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_probe;
mod embedding;
mod llm;
mod object_storage;
mod tts_engine;
mod vector_search;

pub use audio_probe::{AudioProbeError, AudioProbePort};
pub use embedding::{EmbeddingError, EmbeddingPort};
pub use llm::{LlmError, LlmPort, LlmRequest, LlmResponse};
pub use object_storage::{content_addressed_name, ObjectStoragePort, StorageError, UploadObject};
pub use tts_engine::{SpeechAudio, SpeechRequest, TtsEnginePort, TtsError};
pub use vector_search::{SearchHit, SearchQuery, VectorSearchError, VectorSearchPort};
