//! 摘要工作流
//!
//! detect_language → summarize_pages → summarize_book → assemble

use std::sync::Arc;

use async_trait::async_trait;

use super::common::{DetectLanguage, RunReport};
use crate::application::agents::summary::{summarize_book, summarize_page};
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::workflow::{fan_out_pages, Stage, WorkflowGraph, WorkflowState};
use crate::domain::{Language, Page};

#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub pages: Vec<Page>,
    pub model: String,
    pub language: Option<Language>,
}

/// 单页摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub page_key: i64,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct SummaryResult {
    pub report: RunReport,
    pub summary: String,
    pub page_summaries: Vec<PageSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct SummaryOutputs {
    pub page_summaries: Vec<PageSummary>,
    pub degraded_pages: Vec<i64>,
    pub summary: String,
}

struct SummarizePages {
    llm: Arc<dyn LlmPort>,
}

#[async_trait]
impl Stage<SummaryOutputs> for SummarizePages {
    fn name(&self) -> &'static str {
        "summarize_pages"
    }

    async fn run(&self, state: &WorkflowState<SummaryOutputs>) -> Result<WorkflowState<SummaryOutputs>, WorkflowError> {
        let llm = self.llm.as_ref();
        let language = state.language();
        let model = state.model.as_str();

        let results = fan_out_pages(
            &state.pages,
            |page| summarize_page(llm, model, language, page),
            |_, _| String::new(),
        )
        .await;

        Ok(state.with_outputs(|o| {
            o.degraded_pages = results.iter().filter(|r| r.degraded).map(|r| r.page_key).collect();
            o.page_summaries = results
                .into_iter()
                .map(|r| PageSummary {
                    page_key: r.page_key,
                    summary: r.value,
                })
                .collect();
        }))
    }
}

struct SummarizeBook {
    llm: Arc<dyn LlmPort>,
}

#[async_trait]
impl Stage<SummaryOutputs> for SummarizeBook {
    fn name(&self) -> &'static str {
        "summarize_book"
    }

    async fn run(&self, state: &WorkflowState<SummaryOutputs>) -> Result<WorkflowState<SummaryOutputs>, WorkflowError> {
        let summaries: Vec<String> = state
            .outputs
            .page_summaries
            .iter()
            .map(|p| p.summary.clone())
            .collect();
        let summary = summarize_book(self.llm.as_ref(), &state.model, state.language(), &summaries).await?;
        Ok(state.with_outputs(|o| o.summary = summary))
    }
}

struct Assemble;

#[async_trait]
impl Stage<SummaryOutputs> for Assemble {
    fn name(&self) -> &'static str {
        "assemble"
    }

    async fn run(&self, state: &WorkflowState<SummaryOutputs>) -> Result<WorkflowState<SummaryOutputs>, WorkflowError> {
        let outputs = &state.outputs;
        if outputs.summary.trim().is_empty() {
            return Err(WorkflowError::validation("nothing to summarize"));
        }
        if outputs.degraded_pages.is_empty() {
            return Ok(state.clone());
        }
        Ok(state.with_error(format!(
            "{} of {} pages could not be summarized: {:?}",
            outputs.degraded_pages.len(),
            state.pages.len(),
            outputs.degraded_pages
        )))
    }
}

/// 摘要服务
pub struct SummaryWorkflow {
    graph: WorkflowGraph<SummaryOutputs>,
}

impl SummaryWorkflow {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        let graph = WorkflowGraph::new("summary")
            .then(DetectLanguage::new(llm.clone()))
            .then(SummarizePages { llm: llm.clone() })
            .then(SummarizeBook { llm })
            .then(Assemble);
        Self { graph }
    }

    pub async fn run(&self, request: SummaryRequest) -> SummaryResult {
        let state = WorkflowState::new(request.pages, request.model, request.language);
        let run = self.graph.execute(state).await;
        let report = RunReport::from_run(&run);
        let outputs = run.state.outputs;
        SummaryResult {
            report,
            summary: outputs.summary,
            page_summaries: outputs.page_summaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::LlmError;
    use crate::infrastructure::adapters::FakeLlmClient;

    fn request(pages: Vec<Page>) -> SummaryRequest {
        SummaryRequest {
            pages,
            model: "m".into(),
            language: Some(Language::English),
        }
    }

    #[tokio::test]
    async fn test_page_and_book_summaries() {
        let llm = Arc::new(
            FakeLlmClient::new()
                .on("whole book", "A cat naps.")
                .on("Summarize this page", "Page summary."),
        );
        let result = SummaryWorkflow::new(llm)
            .run(request(vec![Page::from_strs(2, &["It naps."]), Page::from_strs(1, &["A cat."])]))
            .await;

        assert!(result.report.is_completed());
        assert_eq!(result.summary, "A cat naps.");
        let keys: Vec<i64> = result.page_summaries.iter().map(|p| p.page_key).collect();
        assert_eq!(keys, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_failed_pages_degrade_to_empty_summary() {
        let llm = Arc::new(
            FakeLlmClient::new()
                .on("whole book", "A cat naps.")
                .fail_on("Summarize this page", LlmError::ServiceError {
                    status: 500,
                    message: "down".into(),
                }),
        );
        let result = SummaryWorkflow::new(llm)
            .run(request(vec![Page::from_strs(1, &["A cat."])]))
            .await;

        assert!(!result.report.is_completed());
        assert_eq!(result.page_summaries[0].summary, "");
        assert!(result.summary.is_empty());
    }
}
