//! 音频生成 Agent
//!
//! 合成 → 上传 → 测时长，整体受截止时间约束。任一步失败由调用方降级为空 URL / 时长。

use std::sync::Arc;
use std::time::Duration;

use crate::application::error::WorkflowError;
use crate::application::ports::{
    content_addressed_name, AudioProbePort, ObjectStoragePort, SpeechRequest, TtsEnginePort,
    UploadObject,
};
use crate::application::workflow::with_deadline;
use crate::domain::sound::MAX_AUDIO_SECS;

/// 生成结果
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAudio {
    pub url: String,
    /// 实测时长（秒）；探测失败时为 None
    pub duration: Option<f64>,
}

/// 音频生成器
pub struct AudioGenerator {
    tts: Arc<dyn TtsEnginePort>,
    storage: Arc<dyn ObjectStoragePort>,
    probe: Arc<dyn AudioProbePort>,
    deadline: Duration,
}

impl AudioGenerator {
    pub fn new(
        tts: Arc<dyn TtsEnginePort>,
        storage: Arc<dyn ObjectStoragePort>,
        probe: Arc<dyn AudioProbePort>,
        deadline: Duration,
    ) -> Self {
        Self {
            tts,
            storage,
            probe,
            deadline,
        }
    }

    /// 根据描述生成一段音频并上传到 `folder`
    pub async fn render(
        &self,
        description: &str,
        duration_secs: f64,
        folder: &str,
    ) -> Result<RenderedAudio, WorkflowError> {
        with_deadline(self.deadline, self.render_inner(description, duration_secs, folder)).await?
    }

    async fn render_inner(
        &self,
        description: &str,
        duration_secs: f64,
        folder: &str,
    ) -> Result<RenderedAudio, WorkflowError> {
        let request = SpeechRequest::sound(description, duration_secs.min(MAX_AUDIO_SECS));
        let audio = self
            .tts
            .synthesize(request)
            .await
            .map_err(|e| WorkflowError::agent("audio_synthesis", e))?;

        let extension = audio.extension();
        let duration = match self.probe.duration_secs(&audio.audio_data, extension) {
            Ok(secs) => Some(secs),
            Err(e) => {
                tracing::warn!(error = %e, "Audio duration probe failed");
                None
            }
        };

        let file_name = content_addressed_name(&audio.audio_data, extension);
        let url = self
            .storage
            .upload(UploadObject {
                data: audio.audio_data,
                folder: folder.to_string(),
                file_name,
                content_type: audio.content_type,
            })
            .await
            .map_err(|e| WorkflowError::agent("upload", e))?;

        tracing::debug!(
            provider = %audio.provider,
            url = %url,
            duration = ?duration,
            "Audio generated and uploaded"
        );
        Ok(RenderedAudio { url, duration })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{AudioProbeError, TtsError};
    use crate::infrastructure::adapters::{FakeTtsClient, LocalObjectStorage};

    struct FixedProbe(f64);

    impl AudioProbePort for FixedProbe {
        fn duration_secs(&self, _data: &[u8], _hint: &str) -> Result<f64, AudioProbeError> {
            Ok(self.0)
        }
    }

    fn storage(dir: &tempfile::TempDir) -> Arc<LocalObjectStorage> {
        Arc::new(LocalObjectStorage::new(dir.path(), "http://cdn.local"))
    }

    #[tokio::test]
    async fn test_render_uploads_under_content_key() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(FakeTtsClient::new(b"fake-audio".to_vec()));
        let generator = AudioGenerator::new(
            tts.clone(),
            storage(&dir),
            Arc::new(FixedProbe(2.5)),
            Duration::from_secs(180),
        );

        let rendered = generator.render("rain", 40.0, "sound/effects").await.unwrap();
        assert_eq!(rendered.duration, Some(2.5));
        assert!(rendered.url.starts_with("http://cdn.local/sound/effects/"));
        assert!(rendered.url.ends_with(".mp3"));
        assert_eq!(tts.requests()[0].duration_secs, Some(MAX_AUDIO_SECS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_respects_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(FakeTtsClient::new(b"x".to_vec()).with_delay(Duration::from_secs(600)));
        let generator = AudioGenerator::new(
            tts,
            storage(&dir),
            Arc::new(FixedProbe(1.0)),
            Duration::from_secs(180),
        );

        let result = generator.render("thunder", 3.0, "sound/effects").await;
        assert!(matches!(result, Err(WorkflowError::Timeout { secs: 180 })));
    }

    #[tokio::test]
    async fn test_render_propagates_synthesis_error() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(FakeTtsClient::failing(TtsError::QuotaExceeded("none left".into())));
        let generator = AudioGenerator::new(
            tts,
            storage(&dir),
            Arc::new(FixedProbe(1.0)),
            Duration::from_secs(180),
        );

        let result = generator.render("wind", 3.0, "sound/music").await;
        assert!(matches!(result, Err(WorkflowError::Agent { agent: "audio_synthesis", .. })));
    }
}
