//! 剧本工作流：detect_language → generate_script → parse_script → assemble

use std::sync::Arc;

use async_trait::async_trait;

use super::common::{DetectLanguage, RunReport};
use crate::application::agents::play::{generate_play, DEFAULT_PLAY_ATTEMPTS};
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::workflow::{Stage, WorkflowGraph, WorkflowState};
use crate::domain::page::full_text;
use crate::domain::play_script::parse_script;
use crate::domain::{Language, Page, PlayScript};

#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub pages: Vec<Page>,
    pub model: String,
    pub language: Option<Language>,
    /// 旁白之外的角色数
    pub speaker_count: usize,
}

#[derive(Debug, Clone)]
pub struct PlayResult {
    pub report: RunReport,
    pub script: Option<PlayScript>,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct PlayOutputs {
    pub speaker_count: usize,
    pub max_attempts: u32,
    /// 生成阶段的原始文本
    pub raw: Option<String>,
    pub script: Option<PlayScript>,
    pub attempts: u32,
}

impl Default for PlayOutputs {
    fn default() -> Self {
        Self {
            speaker_count: 2,
            max_attempts: DEFAULT_PLAY_ATTEMPTS,
            raw: None,
            script: None,
            attempts: 0,
        }
    }
}

struct GenerateScript {
    llm: Arc<dyn LlmPort>,
}

#[async_trait]
impl Stage<PlayOutputs> for GenerateScript {
    fn name(&self) -> &'static str {
        "generate_script"
    }

    async fn run(&self, state: &WorkflowState<PlayOutputs>) -> Result<WorkflowState<PlayOutputs>, WorkflowError> {
        let text = full_text(&state.pages);
        if text.trim().is_empty() {
            return Err(WorkflowError::validation("no text to adapt into a script"));
        }
        let outcome = generate_play(
            self.llm.as_ref(),
            &state.model,
            state.language(),
            &text,
            state.outputs.speaker_count,
            state.outputs.max_attempts,
        )
        .await?;

        Ok(state.with_outputs(|o| {
            o.attempts = outcome.attempts;
            o.raw = Some(outcome.raw);
        }))
    }
}

struct ParseScript;

#[async_trait]
impl Stage<PlayOutputs> for ParseScript {
    fn name(&self) -> &'static str {
        "parse_script"
    }

    async fn run(&self, state: &WorkflowState<PlayOutputs>) -> Result<WorkflowState<PlayOutputs>, WorkflowError> {
        let Some(raw) = &state.outputs.raw else {
            return Err(WorkflowError::Internal("script text missing before parsing".into()));
        };
        let script = parse_script(raw);
        Ok(state.with_outputs(|o| o.script = Some(script)))
    }
}

struct Assemble;

#[async_trait]
impl Stage<PlayOutputs> for Assemble {
    fn name(&self) -> &'static str {
        "assemble"
    }

    async fn run(&self, state: &WorkflowState<PlayOutputs>) -> Result<WorkflowState<PlayOutputs>, WorkflowError> {
        let Some(script) = &state.outputs.script else {
            return Err(WorkflowError::Internal("script missing before assembly".into()));
        };
        if script.lines.is_empty() {
            return Err(WorkflowError::validation("generated script has no speaker lines"));
        }
        let unmappable = script.lines.iter().filter(|l| !l.mappable).count();
        if unmappable > 0 {
            tracing::warn!(
                unmappable = unmappable,
                flagged = ?script.flagged_speakers,
                "Script contains lines that cannot be voiced"
            );
        }
        Ok(state.clone())
    }
}

/// 剧本服务
pub struct PlayWorkflow {
    graph: WorkflowGraph<PlayOutputs>,
    max_attempts: u32,
}

impl PlayWorkflow {
    pub fn new(llm: Arc<dyn LlmPort>, max_attempts: u32) -> Self {
        let graph = WorkflowGraph::new("play")
            .then(DetectLanguage::new(llm.clone()))
            .then(GenerateScript { llm })
            .then(ParseScript)
            .then(Assemble);
        Self {
            graph,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn run(&self, request: PlayRequest) -> PlayResult {
        let mut state: WorkflowState<PlayOutputs> =
            WorkflowState::new(request.pages, request.model, request.language);
        state.outputs.speaker_count = request.speaker_count.max(1);
        state.outputs.max_attempts = self.max_attempts;

        let run = self.graph.execute(state).await;
        PlayResult {
            report: RunReport::from_run(&run),
            script: run.state.outputs.script,
            attempts: run.state.outputs.attempts,
        }
    }
}
