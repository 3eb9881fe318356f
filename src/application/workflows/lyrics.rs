//! 歌词工作流：detect_language → generate_lyrics

use std::sync::Arc;

use async_trait::async_trait;

use super::common::{DetectLanguage, RunReport};
use crate::application::agents::lyrics::generate_lyrics;
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::workflow::{Stage, WorkflowGraph, WorkflowState};
use crate::domain::page::full_text;
use crate::domain::{Language, Lyrics, Page};

#[derive(Debug, Clone)]
pub struct LyricsRequest {
    pub pages: Vec<Page>,
    pub model: String,
    pub language: Option<Language>,
    pub genre: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LyricsResult {
    pub report: RunReport,
    pub lyrics: Option<Lyrics>,
}

#[derive(Debug, Clone, Default)]
pub struct LyricsOutputs {
    pub genre: Option<String>,
    pub lyrics: Option<Lyrics>,
}

struct GenerateLyrics {
    llm: Arc<dyn LlmPort>,
}

#[async_trait]
impl Stage<LyricsOutputs> for GenerateLyrics {
    fn name(&self) -> &'static str {
        "generate_lyrics"
    }

    async fn run(&self, state: &WorkflowState<LyricsOutputs>) -> Result<WorkflowState<LyricsOutputs>, WorkflowError> {
        let text = full_text(&state.pages);
        if text.trim().is_empty() {
            return Err(WorkflowError::validation("no text to write lyrics from"));
        }
        let lyrics = generate_lyrics(
            self.llm.as_ref(),
            &state.model,
            state.language(),
            &text,
            state.outputs.genre.as_deref(),
        )
        .await?;
        Ok(state.with_outputs(|o| o.lyrics = Some(lyrics)))
    }
}

/// 歌词服务
pub struct LyricsWorkflow {
    graph: WorkflowGraph<LyricsOutputs>,
}

impl LyricsWorkflow {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        let graph = WorkflowGraph::new("lyrics")
            .then(DetectLanguage::new(llm.clone()))
            .then(GenerateLyrics { llm });
        Self { graph }
    }

    pub async fn run(&self, request: LyricsRequest) -> LyricsResult {
        let mut state: WorkflowState<LyricsOutputs> =
            WorkflowState::new(request.pages, request.model, request.language);
        state.outputs.genre = request.genre.filter(|g| !g.trim().is_empty());

        let run = self.graph.execute(state).await;
        LyricsResult {
            report: RunReport::from_run(&run),
            lyrics: run.state.outputs.lyrics,
        }
    }
}
