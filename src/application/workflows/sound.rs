//! 音效工作流
//!
//! detect_language → select_background_music → select_sound_effects
//! → position_effects → generate_audio → assemble
//!
//! 每个阶段都按页并发；单页失败只影响该页的条目。

use std::sync::Arc;

use async_trait::async_trait;

use super::common::{DetectLanguage, RunReport};
use crate::application::agents::audio::AudioGenerator;
use crate::application::agents::sound::{position_effect, select_effect, select_music, SoundCatalog};
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::workflow::{fan_out_pages, Stage, WorkflowGraph, WorkflowState};
use crate::domain::sound::MAX_AUDIO_SECS;
use crate::domain::{BackgroundMusic, Language, Page, SoundEffect};

const MUSIC_FOLDER: &str = "sound/music";
const EFFECT_FOLDER: &str = "sound/effects";

#[derive(Debug, Clone)]
pub struct SoundRequest {
    pub pages: Vec<Page>,
    pub model: String,
    pub language: Option<Language>,
    pub generate_audio: bool,
}

#[derive(Debug, Clone)]
pub struct SoundResult {
    pub report: RunReport,
    pub background_music: Vec<BackgroundMusic>,
    pub sound_effects: Vec<SoundEffect>,
}

#[derive(Debug, Clone, Default)]
pub struct SoundOutputs {
    pub generate_audio: bool,
    pub music: Vec<BackgroundMusic>,
    pub effects: Vec<SoundEffect>,
    /// 选择阶段降级的页
    pub degraded_pages: Vec<i64>,
    /// 音频生成失败的条目数
    pub audio_failures: usize,
}

fn merge_degraded(existing: &[i64], more: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut merged: Vec<i64> = existing.iter().copied().chain(more).collect();
    merged.sort_unstable();
    merged.dedup();
    merged
}

struct SelectBackgroundMusic {
    llm: Arc<dyn LlmPort>,
    catalog: Arc<SoundCatalog>,
}

#[async_trait]
impl Stage<SoundOutputs> for SelectBackgroundMusic {
    fn name(&self) -> &'static str {
        "select_background_music"
    }

    async fn run(&self, state: &WorkflowState<SoundOutputs>) -> Result<WorkflowState<SoundOutputs>, WorkflowError> {
        let llm = self.llm.as_ref();
        let catalog = self.catalog.as_ref();
        let language = state.language();
        let model = state.model.as_str();

        let results = fan_out_pages(
            &state.pages,
            |page| async move {
                let candidates = catalog.music_candidates(&page.joined_text()).await?;
                Ok::<_, WorkflowError>(select_music(llm, model, language, page, &candidates).await)
            },
            |page, error| BackgroundMusic::unselected(page.page_key, error),
        )
        .await;

        Ok(state.with_outputs(|o| {
            o.degraded_pages = merge_degraded(
                &o.degraded_pages,
                results.iter().filter(|r| r.degraded).map(|r| r.page_key),
            );
            o.music = results.into_iter().map(|r| r.value).collect();
        }))
    }
}

struct SelectSoundEffects {
    llm: Arc<dyn LlmPort>,
    catalog: Arc<SoundCatalog>,
}

#[async_trait]
impl Stage<SoundOutputs> for SelectSoundEffects {
    fn name(&self) -> &'static str {
        "select_sound_effects"
    }

    async fn run(&self, state: &WorkflowState<SoundOutputs>) -> Result<WorkflowState<SoundOutputs>, WorkflowError> {
        let llm = self.llm.as_ref();
        let catalog = self.catalog.as_ref();
        let language = state.language();
        let model = state.model.as_str();

        let results = fan_out_pages(
            &state.pages,
            |page| async move {
                let candidates = catalog.effect_candidates(&page.joined_text()).await?;
                Ok::<_, WorkflowError>(select_effect(llm, model, language, page, &candidates).await)
            },
            |page, error| SoundEffect::unselected(page.page_key, error),
        )
        .await;

        Ok(state.with_outputs(|o| {
            o.degraded_pages = merge_degraded(
                &o.degraded_pages,
                results.iter().filter(|r| r.degraded).map(|r| r.page_key),
            );
            o.effects = results.into_iter().map(|r| r.value).collect();
        }))
    }
}

struct PositionEffects {
    llm: Arc<dyn LlmPort>,
}

#[async_trait]
impl Stage<SoundOutputs> for PositionEffects {
    fn name(&self) -> &'static str {
        "position_effects"
    }

    async fn run(&self, state: &WorkflowState<SoundOutputs>) -> Result<WorkflowState<SoundOutputs>, WorkflowError> {
        let llm = self.llm.as_ref();
        let model = state.model.as_str();
        let effects = &state.outputs.effects;

        let results = fan_out_pages(
            &state.pages,
            |page| async move {
                let Some(effect) = effects.iter().find(|e| e.page_key == page.page_key) else {
                    return Ok::<_, WorkflowError>(None);
                };
                let mut effect = effect.clone();
                if effect.is_selected() {
                    effect.position = Some(position_effect(llm, model, page, &effect).await);
                }
                Ok(Some(effect))
            },
            |page, _| {
                effects
                    .iter()
                    .find(|e| e.page_key == page.page_key)
                    .cloned()
            },
        )
        .await;

        Ok(state.with_outputs(|o| {
            o.effects = results.into_iter().filter_map(|r| r.value).collect();
        }))
    }
}

struct GenerateAudio {
    generator: Arc<AudioGenerator>,
}

impl GenerateAudio {
    /// 生成失败时该条目的 url / duration 留空
    async fn render_page(
        &self,
        music: Option<BackgroundMusic>,
        effect: Option<SoundEffect>,
    ) -> (Option<BackgroundMusic>, Option<SoundEffect>, usize) {
        let mut failures = 0;

        let music = match music {
            Some(mut music) if music.is_selected() => {
                match self.generator.render(&music.prompt_text(), MAX_AUDIO_SECS, MUSIC_FOLDER).await {
                    Ok(audio) => {
                        music.url = Some(audio.url);
                        music.duration = audio.duration;
                    }
                    Err(e) => {
                        failures += 1;
                        tracing::warn!(page_key = music.page_key, error = %e, "Music generation failed");
                    }
                }
                Some(music)
            }
            other => other,
        };

        let effect = match effect {
            Some(mut effect) if effect.is_selected() => {
                let secs = effect.position.as_ref().map_or(MAX_AUDIO_SECS, |p| p.duration);
                match self.generator.render(&effect.prompt_text(), secs, EFFECT_FOLDER).await {
                    Ok(audio) => {
                        effect.url = Some(audio.url);
                        effect.duration = audio.duration;
                    }
                    Err(e) => {
                        failures += 1;
                        tracing::warn!(page_key = effect.page_key, error = %e, "Effect generation failed");
                    }
                }
                Some(effect)
            }
            other => other,
        };

        (music, effect, failures)
    }
}

#[async_trait]
impl Stage<SoundOutputs> for GenerateAudio {
    fn name(&self) -> &'static str {
        "generate_audio"
    }

    async fn run(&self, state: &WorkflowState<SoundOutputs>) -> Result<WorkflowState<SoundOutputs>, WorkflowError> {
        if !state.outputs.generate_audio {
            tracing::debug!("Audio generation not requested");
            return Ok(state.clone());
        }

        let outputs = &state.outputs;
        let results = fan_out_pages(
            &state.pages,
            |page| async move {
                let music = outputs.music.iter().find(|m| m.page_key == page.page_key).cloned();
                let effect = outputs.effects.iter().find(|e| e.page_key == page.page_key).cloned();
                Ok::<_, WorkflowError>(self.render_page(music, effect).await)
            },
            |page, _| {
                let music = outputs.music.iter().find(|m| m.page_key == page.page_key).cloned();
                let effect = outputs.effects.iter().find(|e| e.page_key == page.page_key).cloned();
                (music, effect, 1)
            },
        )
        .await;

        Ok(state.with_outputs(|o| {
            o.audio_failures = results.iter().map(|r| r.value.2).sum();
            let (music, effects): (Vec<_>, Vec<_>) =
                results.into_iter().map(|r| (r.value.0, r.value.1)).unzip();
            o.music = music.into_iter().flatten().collect();
            o.effects = effects.into_iter().flatten().collect();
        }))
    }
}

struct Assemble;

#[async_trait]
impl Stage<SoundOutputs> for Assemble {
    fn name(&self) -> &'static str {
        "assemble"
    }

    async fn run(&self, state: &WorkflowState<SoundOutputs>) -> Result<WorkflowState<SoundOutputs>, WorkflowError> {
        let outputs = &state.outputs;
        let mut problems = Vec::new();
        if !outputs.degraded_pages.is_empty() {
            problems.push(format!("selection failed for pages {:?}", outputs.degraded_pages));
        }
        if outputs.audio_failures > 0 {
            problems.push(format!("{} audio items could not be generated", outputs.audio_failures));
        }
        if problems.is_empty() {
            return Ok(state.clone());
        }
        Ok(state.with_error(problems.join("; ")))
    }
}

/// 音效服务
pub struct SoundWorkflow {
    graph: WorkflowGraph<SoundOutputs>,
    audio_enabled: bool,
}

impl SoundWorkflow {
    /// `generator` 为 None 时不生成音频，只返回选择结果
    pub fn new(
        llm: Arc<dyn LlmPort>,
        catalog: Arc<SoundCatalog>,
        generator: Option<Arc<AudioGenerator>>,
    ) -> Self {
        let mut graph = WorkflowGraph::new("sound")
            .then(DetectLanguage::new(llm.clone()))
            .then(SelectBackgroundMusic {
                llm: llm.clone(),
                catalog: catalog.clone(),
            })
            .then(SelectSoundEffects {
                llm: llm.clone(),
                catalog,
            })
            .then(PositionEffects { llm });

        let audio_enabled = generator.is_some();
        if let Some(generator) = generator {
            graph = graph.then(GenerateAudio { generator });
        }
        Self {
            graph: graph.then(Assemble),
            audio_enabled,
        }
    }

    pub async fn run(&self, request: SoundRequest) -> SoundResult {
        let mut state: WorkflowState<SoundOutputs> =
            WorkflowState::new(request.pages, request.model, request.language);
        state.outputs.generate_audio = request.generate_audio && self.audio_enabled;

        let run = self.graph.execute(state).await;
        let report = RunReport::from_run(&run);
        let outputs = run.state.outputs;
        SoundResult {
            report,
            background_music: outputs.music,
            sound_effects: outputs.effects,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::ports::{AudioProbeError, AudioProbePort, TtsError};
    use crate::infrastructure::adapters::{
        FakeEmbeddingClient, FakeLlmClient, FakeTtsClient, FakeVectorSearch, LocalObjectStorage,
    };

    struct FixedProbe;

    impl AudioProbePort for FixedProbe {
        fn duration_secs(&self, _data: &[u8], _hint: &str) -> Result<f64, AudioProbeError> {
            Ok(3.0)
        }
    }

    fn catalog() -> Arc<SoundCatalog> {
        let search = FakeVectorSearch::new()
            .with_hit("music", 0.9, "music/calm_piano.mp3", "calm piano")
            .with_hit("effects", 0.8, "fx/door_knock.wav", "");
        Arc::new(SoundCatalog::new(
            Arc::new(FakeEmbeddingClient::new(4)),
            Arc::new(search),
            "music",
            "effects",
            5,
        ))
    }

    fn llm() -> Arc<FakeLlmClient> {
        Arc::new(
            FakeLlmClient::new()
                .on("background music", r#"{"index": 0, "reason": "quiet"}"#)
                .on("Choose the one sound effect", r#"{"index": 0, "reason": "knock"}"#)
                .on("(start)", r#"{"position": 4, "duration": 2}"#),
        )
    }

    fn request(generate_audio: bool) -> SoundRequest {
        SoundRequest {
            pages: vec![
                Page::from_strs(2, &["Someone knocked on the door."]),
                Page::from_strs(1, &["The night was quiet."]),
            ],
            model: "m".into(),
            language: Some(Language::English),
            generate_audio,
        }
    }

    #[tokio::test]
    async fn test_selection_without_audio() {
        let workflow = SoundWorkflow::new(llm(), catalog(), None);
        let result = workflow.run(request(true)).await;

        assert!(result.report.is_completed());
        assert_eq!(result.background_music.len(), 2);
        assert_eq!(result.background_music[0].page_key, 1);
        assert_eq!(result.background_music[0].music_path, "music/calm_piano.mp3");
        assert!(result.background_music[0].url.is_none());

        let effect = &result.sound_effects[1];
        assert_eq!(effect.effect_path, "fx/door_knock.wav");
        let position = effect.position.as_ref().unwrap();
        assert_eq!(position.position, 4.0);
        assert_eq!(position.duration, 2.0);
    }

    #[tokio::test]
    async fn test_audio_generated_and_uploaded() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(FakeTtsClient::new(b"audio".to_vec()));
        let generator = AudioGenerator::new(
            tts.clone(),
            Arc::new(LocalObjectStorage::new(dir.path(), "http://cdn.local")),
            Arc::new(FixedProbe),
            Duration::from_secs(180),
        );
        let workflow = SoundWorkflow::new(llm(), catalog(), Some(Arc::new(generator)));
        let result = workflow.run(request(true)).await;

        assert!(result.report.is_completed());
        let music = &result.background_music[0];
        assert!(music.url.as_deref().unwrap().contains("/sound/music/"));
        assert_eq!(music.duration, Some(3.0));
        let effect = &result.sound_effects[0];
        assert!(effect.url.as_deref().unwrap().contains("/sound/effects/"));

        let requests = tts.requests();
        assert_eq!(requests.len(), 4);
        assert!(requests.iter().any(|r| r.duration_secs == Some(2.0)));
        assert!(requests.iter().any(|r| r.text == "door knock"));
    }

    #[tokio::test]
    async fn test_audio_failure_leaves_fields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let generator = AudioGenerator::new(
            Arc::new(FakeTtsClient::failing(TtsError::QuotaExceeded("none".into()))),
            Arc::new(LocalObjectStorage::new(dir.path(), "http://cdn.local")),
            Arc::new(FixedProbe),
            Duration::from_secs(180),
        );
        let workflow = SoundWorkflow::new(llm(), catalog(), Some(Arc::new(generator)));
        let result = workflow.run(request(true)).await;

        assert!(!result.report.is_completed());
        assert_eq!(result.background_music.len(), 2);
        assert!(result.background_music.iter().all(|m| m.url.is_none() && m.duration.is_none()));
        assert!(result.report.error.unwrap().contains("4 audio items"));
    }

    #[tokio::test]
    async fn test_audio_skipped_when_not_requested() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(FakeTtsClient::new(b"audio".to_vec()));
        let generator = AudioGenerator::new(
            tts.clone(),
            Arc::new(LocalObjectStorage::new(dir.path(), "http://cdn.local")),
            Arc::new(FixedProbe),
            Duration::from_secs(180),
        );
        let workflow = SoundWorkflow::new(llm(), catalog(), Some(Arc::new(generator)));
        let result = workflow.run(request(false)).await;

        assert!(result.report.is_completed());
        assert!(tts.requests().is_empty());
    }
}
