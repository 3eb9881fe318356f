//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 始终返回固定的音频数据（或固定错误），不实际调用 TTS 服务

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{SpeechAudio, SpeechRequest, TtsEnginePort, TtsError};

/// Fake TTS Client
///
/// 记录收到的全部请求
pub struct FakeTtsClient {
    reply: Result<Vec<u8>, TtsError>,
    content_type: String,
    provider: String,
    delay: Option<Duration>,
    requests: Mutex<Vec<SpeechRequest>>,
}

impl FakeTtsClient {
    /// 始终返回 `audio_data`
    pub fn new(audio_data: Vec<u8>) -> Self {
        Self {
            reply: Ok(audio_data),
            content_type: "audio/mpeg".to_string(),
            provider: "fake".to_string(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 始终返回 `error`
    pub fn failing(error: TtsError) -> Self {
        Self {
            reply: Err(error),
            ..Self::new(Vec::new())
        }
    }

    /// 模拟合成耗时
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// 已收到的请求
    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio, TtsError> {
        tracing::debug!(
            text_len = request.text.len(),
            duration = ?request.duration_secs,
            "FakeTtsClient: returning fixed audio"
        );
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let audio_data = self.reply.clone()?;
        Ok(SpeechAudio {
            audio_data,
            content_type: self.content_type.clone(),
            provider: self.provider.clone(),
        })
    }
}
