//! HTTP TTS Client - 调用外部音频合成 HTTP 服务
//!
//! 实现 TtsEnginePort trait，通过 HTTP 调用外部音频生成服务
//!
//! 外部 API:
//! POST {base_url}/v1/sound-generation
//! Request: {"text": "...", "duration_seconds": 5.0, "voice_id": "..."}  (JSON)
//! Response: audio binary, MIME 类型在 Content-Type 中

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SpeechAudio, SpeechRequest, TtsEnginePort, TtsError};
use crate::application::resilience::{retry_with_backoff, RetryError, RetryPolicy};
use crate::domain::sound::{MAX_AUDIO_SECS, MIN_EFFECT_SECS};

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_id: Option<&'a str>,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// 供应商名称（日志用）
    pub name: String,
    /// 服务基础 URL
    pub base_url: String,
    pub api_key: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 限流时的重试次数
    pub max_retries: u32,
    /// 首次重试前的等待（毫秒）
    pub base_delay_ms: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            name: "primary".to_string(),
            base_url: "http://localhost:8000".to_string(),
            api_key: None,
            timeout_secs: 120,
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.base_delay_ms = base_delay_ms;
        self
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
            .with_transient(1, Duration::from_millis(self.base_delay_ms / 2))
    }
}

/// 供应商时长上限
fn clamp_duration(secs: f64) -> f64 {
    if secs.is_finite() {
        secs.clamp(MIN_EFFECT_SECS, MAX_AUDIO_SECS)
    } else {
        MAX_AUDIO_SECS
    }
}

/// 非 2xx 状态码转错误
fn status_error(status: StatusCode, body: String) -> TtsError {
    match status.as_u16() {
        429 => TtsError::RateLimited(body),
        402 => TtsError::QuotaExceeded(body),
        401 | 403 if body.to_lowercase().contains("quota") => TtsError::QuotaExceeded(body),
        404 => TtsError::VoiceNotFound(body),
        code => TtsError::ServiceError(format!("HTTP {}: {}", code, body)),
    }
}

/// HTTP TTS 客户端
///
/// 限流按指数退避重试；重试用尽时返回 `RateLimitExhausted`，由上层切换备用供应商
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取合成 URL
    fn generation_url(&self) -> String {
        format!("{}/v1/sound-generation", self.config.base_url.trim_end_matches('/'))
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, request: &SpeechRequest) -> Result<SpeechAudio, TtsError> {
        let body = TtsHttpRequest {
            text: &request.text,
            duration_seconds: request.duration_secs.map(clamp_duration),
            voice_id: request.voice.as_deref(),
        };

        let mut builder = self.client.post(self.generation_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("xi-api-key", key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TtsError::Timeout
            } else if e.is_connect() {
                TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
            } else {
                TtsError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, error_text));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("audio/"))
            .unwrap_or_else(|| "audio/mpeg".to_string());

        // 直接获取音频字节
        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();
        if audio_data.is_empty() {
            return Err(TtsError::InvalidResponse("empty audio body".to_string()));
        }

        Ok(SpeechAudio {
            audio_data,
            content_type,
            provider: self.config.name.clone(),
        })
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio, TtsError> {
        tracing::debug!(
            provider = %self.config.name,
            url = %self.generation_url(),
            text_len = request.text.len(),
            duration = ?request.duration_secs,
            "Sending sound generation request"
        );

        let policy = self.config.retry_policy();
        let result = retry_with_backoff(&policy, "tts", TtsError::retry_decision, |_| {
            self.send_once(&request)
        })
        .await;

        match result {
            Ok(audio) => {
                tracing::info!(
                    provider = %audio.provider,
                    audio_size = audio.audio_data.len(),
                    "Sound generation completed"
                );
                Ok(audio)
            }
            Err(RetryError::Exhausted {
                attempts,
                last: TtsError::RateLimited(_),
            }) => Err(TtsError::RateLimitExhausted { attempts }),
            Err(e) => Err(e.into_last_error()),
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
