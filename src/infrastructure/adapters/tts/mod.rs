//! TTS Adapter - 音频合成客户端实现

mod fake_tts_client;
mod fallback_tts_engine;
mod http_tts_client;

pub use fake_tts_client::FakeTtsClient;
pub use fallback_tts_engine::FallbackTtsEngine;
pub use http_tts_client::{HttpTtsClient, HttpTtsClientConfig};
