//! 翻译工作流：translate → assemble
//!
//! 源文本总字数不超过阈值时走索引映射（一次调用、严格对齐）；
//! 超过阈值时按页分块翻译并按比例重映射

use std::sync::Arc;

use async_trait::async_trait;

use super::common::RunReport;
use crate::application::agents::translator::{translate_index_mapped, translate_page_chunked};
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::workflow::{fan_out_pages, Stage, WorkflowGraph, WorkflowState};
use crate::domain::page::total_chars;
use crate::domain::{Language, Page};

/// 翻译参数
#[derive(Debug, Clone, Copy)]
pub struct TranslationSettings {
    /// 首次之外的重试次数
    pub max_retries: u32,
    /// 超过该字数走分块路径
    pub chunk_threshold_chars: usize,
    pub chunk_max_chars: usize,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            chunk_threshold_chars: 20_000,
            chunk_max_chars: 3_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub pages: Vec<Page>,
    pub model: String,
    pub target: Language,
}

#[derive(Debug, Clone)]
pub struct TranslationResult {
    pub report: RunReport,
    /// 失败时为空
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationPath {
    #[default]
    IndexMapped,
    Chunked,
}

#[derive(Debug, Clone, Default)]
pub struct TranslationOutputs {
    pub path: TranslationPath,
    pub translated: Vec<Page>,
    /// 分块路径中保留原文的页
    pub degraded_pages: Vec<i64>,
    /// 分块路径中句数不一致、按比例分配的页
    pub remapped_pages: Vec<i64>,
}

struct Translate {
    llm: Arc<dyn LlmPort>,
    settings: TranslationSettings,
}

#[async_trait]
impl Stage<TranslationOutputs> for Translate {
    fn name(&self) -> &'static str {
        "translate"
    }

    async fn run(
        &self,
        state: &WorkflowState<TranslationOutputs>,
    ) -> Result<WorkflowState<TranslationOutputs>, WorkflowError> {
        let target = state.language();
        let chars = total_chars(&state.pages);

        if chars <= self.settings.chunk_threshold_chars {
            let translated = translate_index_mapped(
                self.llm.as_ref(),
                &state.model,
                target,
                &state.pages,
                self.settings.max_retries,
            )
            .await?;
            return Ok(state.with_outputs(|o| {
                o.path = TranslationPath::IndexMapped;
                o.translated = translated;
            }));
        }

        tracing::info!(
            chars = chars,
            threshold = self.settings.chunk_threshold_chars,
            "Content exceeds threshold, using chunked translation"
        );
        let llm = self.llm.as_ref();
        let model = state.model.as_str();
        let max_chars = self.settings.chunk_max_chars;

        let results = fan_out_pages(
            &state.pages,
            |page| async move {
                translate_page_chunked(llm, model, target, page, max_chars)
                    .await
                    .map(|(translated, report)| (translated, Some(report)))
            },
            |page, _| (page.clone(), None),
        )
        .await;

        Ok(state.with_outputs(|o| {
            o.path = TranslationPath::Chunked;
            o.degraded_pages = results.iter().filter(|r| r.degraded).map(|r| r.page_key).collect();
            o.remapped_pages = results
                .iter()
                .filter(|r| matches!(&r.value.1, Some(report) if !report.is_exact()))
                .map(|r| r.page_key)
                .collect();
            o.translated = results.into_iter().map(|r| r.value.0).collect();
        }))
    }
}

struct Assemble;

#[async_trait]
impl Stage<TranslationOutputs> for Assemble {
    fn name(&self) -> &'static str {
        "assemble"
    }

    async fn run(
        &self,
        state: &WorkflowState<TranslationOutputs>,
    ) -> Result<WorkflowState<TranslationOutputs>, WorkflowError> {
        let outputs = &state.outputs;
        if outputs.translated.len() != state.pages.len() {
            return Err(WorkflowError::Translation(format!(
                "expected {} pages, got {}",
                state.pages.len(),
                outputs.translated.len()
            )));
        }
        if !outputs.remapped_pages.is_empty() {
            tracing::warn!(pages = ?outputs.remapped_pages, "Pages remapped proportionally");
        }
        if outputs.degraded_pages.is_empty() {
            return Ok(state.clone());
        }
        Ok(state.with_error(format!(
            "{} of {} pages could not be translated: {:?}",
            outputs.degraded_pages.len(),
            state.pages.len(),
            outputs.degraded_pages
        )))
    }
}

/// 翻译服务
pub struct TranslationWorkflow {
    graph: WorkflowGraph<TranslationOutputs>,
}

impl TranslationWorkflow {
    pub fn new(llm: Arc<dyn LlmPort>, settings: TranslationSettings) -> Self {
        let graph = WorkflowGraph::new("translation")
            .then(Translate { llm, settings })
            .then(Assemble);
        Self { graph }
    }

    pub async fn run(&self, request: TranslationRequest) -> TranslationResult {
        let state = WorkflowState::new(request.pages, request.model, Some(request.target));
        let run = self.graph.execute(state).await;
        let report = RunReport::from_run(&run);

        let pages = if run.is_completed() || !run.state.outputs.translated.is_empty() {
            run.state.outputs.translated
        } else {
            Vec::new()
        };
        TranslationResult { report, pages }
    }
}
