//! 主备 TTS 组合
//!
//! 主供应商限流重试耗尽或配额耗尽时改用备用供应商

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{SpeechAudio, SpeechRequest, TtsEnginePort, TtsError};

pub struct FallbackTtsEngine {
    primary: Arc<dyn TtsEnginePort>,
    fallback: Arc<dyn TtsEnginePort>,
}

impl FallbackTtsEngine {
    pub fn new(primary: Arc<dyn TtsEnginePort>, fallback: Arc<dyn TtsEnginePort>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl TtsEnginePort for FallbackTtsEngine {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio, TtsError> {
        match self.primary.synthesize(request.clone()).await {
            Err(e) if e.should_switch_provider() => {
                tracing::warn!(error = %e, "Primary TTS unavailable, switching to fallback");
                self.fallback.synthesize(request).await
            }
            other => other,
        }
    }

    async fn health_check(&self) -> bool {
        self.primary.health_check().await || self.fallback.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeTtsClient;

    #[tokio::test]
    async fn test_rate_limit_exhaustion_switches_provider() {
        let primary = Arc::new(FakeTtsClient::failing(TtsError::RateLimitExhausted { attempts: 4 }));
        let fallback = Arc::new(FakeTtsClient::new(b"backup".to_vec()).with_provider("backup"));
        let engine = FallbackTtsEngine::new(primary.clone(), fallback.clone());

        let audio = engine.synthesize(SpeechRequest::sound("rain", 3.0)).await.unwrap();
        assert_eq!(audio.provider, "backup");
        assert_eq!(primary.requests().len(), 1);
        assert_eq!(fallback.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_do_not_switch() {
        let primary = Arc::new(FakeTtsClient::failing(TtsError::ServiceError("bad".into())));
        let fallback = Arc::new(FakeTtsClient::new(b"backup".to_vec()));
        let engine = FallbackTtsEngine::new(primary, fallback.clone());

        let result = engine.synthesize(SpeechRequest::sound("rain", 3.0)).await;
        assert!(matches!(result, Err(TtsError::ServiceError(_))));
        assert!(fallback.requests().is_empty());
    }
}
