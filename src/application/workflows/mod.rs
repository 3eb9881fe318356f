//! 功能工作流
//!
//! 每个功能一个服务：把请求转成初始状态，执行阶段图，再把最终状态转成结果。
//! 服务本身从不返回错误，失败体现在 `RunReport` 中。

mod common;
pub mod lyrics;
pub mod orthography;
pub mod play;
pub mod quiz;
pub mod sound;
pub mod summary;
pub mod translation;

use std::sync::Arc;
use std::time::Duration;

pub use common::{CompletionState, DetectLanguage, RunReport};
pub use lyrics::{LyricsRequest, LyricsResult, LyricsWorkflow};
pub use orthography::{OrthographyRequest, OrthographyResult, OrthographyWorkflow};
pub use play::{PlayRequest, PlayResult, PlayWorkflow};
pub use quiz::{QuizRequest, QuizResult, QuizWorkflow};
pub use sound::{SoundRequest, SoundResult, SoundWorkflow};
pub use summary::{PageSummary, SummaryRequest, SummaryResult, SummaryWorkflow};
pub use translation::{TranslationRequest, TranslationResult, TranslationSettings, TranslationWorkflow};

use crate::application::agents::audio::AudioGenerator;
use crate::application::agents::sound::SoundCatalog;
use crate::application::ports::{
    AudioProbePort, EmbeddingPort, LlmPort, ObjectStoragePort, TtsEnginePort, VectorSearchPort,
};

/// 工作流参数
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub translation: TranslationSettings,
    pub quiz_default_count: usize,
    pub play_max_attempts: u32,
    pub audio_timeout: Duration,
    pub audio_generation_enabled: bool,
    pub music_collection: String,
    pub effect_collection: String,
    pub search_limit: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            translation: TranslationSettings::default(),
            quiz_default_count: 5,
            play_max_attempts: 3,
            audio_timeout: Duration::from_secs(180),
            audio_generation_enabled: true,
            music_collection: "background_music".to_string(),
            effect_collection: "sound_effects".to_string(),
            search_limit: 5,
        }
    }
}

/// 工作流依赖的外部服务
#[derive(Clone)]
pub struct WorkflowPorts {
    pub llm: Arc<dyn LlmPort>,
    pub embedding: Arc<dyn EmbeddingPort>,
    pub vector_search: Arc<dyn VectorSearchPort>,
    pub tts: Arc<dyn TtsEnginePort>,
    pub storage: Arc<dyn ObjectStoragePort>,
    pub audio_probe: Arc<dyn AudioProbePort>,
}

/// 全部功能服务
pub struct Workflows {
    pub orthography: OrthographyWorkflow,
    pub quiz: QuizWorkflow,
    pub lyrics: LyricsWorkflow,
    pub play: PlayWorkflow,
    pub translation: TranslationWorkflow,
    pub summary: SummaryWorkflow,
    pub sound: SoundWorkflow,
    pub settings: WorkflowSettings,
}

impl Workflows {
    pub fn new(ports: WorkflowPorts, settings: WorkflowSettings) -> Self {
        let llm = ports.llm;

        let catalog = Arc::new(SoundCatalog::new(
            ports.embedding,
            ports.vector_search,
            settings.music_collection.clone(),
            settings.effect_collection.clone(),
            settings.search_limit,
        ));
        let generator = settings.audio_generation_enabled.then(|| {
            Arc::new(AudioGenerator::new(
                ports.tts,
                ports.storage,
                ports.audio_probe,
                settings.audio_timeout,
            ))
        });

        Self {
            orthography: OrthographyWorkflow::new(llm.clone()),
            quiz: QuizWorkflow::new(llm.clone()),
            lyrics: LyricsWorkflow::new(llm.clone()),
            play: PlayWorkflow::new(llm.clone(), settings.play_max_attempts),
            translation: TranslationWorkflow::new(llm.clone(), settings.translation),
            summary: SummaryWorkflow::new(llm.clone()),
            sound: SoundWorkflow::new(llm, catalog, generator),
            settings,
        }
    }
}
