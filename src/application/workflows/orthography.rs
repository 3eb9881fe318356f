//! 校对工作流
//!
//! detect_language → correct_pages → refine_context → assemble

use std::sync::Arc;

use async_trait::async_trait;

use super::common::{DetectLanguage, RunReport};
use crate::application::agents::orthography::{correct_page, refine_page};
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::workflow::{fan_out_pages, Stage, WorkflowGraph, WorkflowState};
use crate::domain::{Language, Page};

#[derive(Debug, Clone)]
pub struct OrthographyRequest {
    pub pages: Vec<Page>,
    pub model: String,
    pub language: Option<Language>,
}

#[derive(Debug, Clone)]
pub struct OrthographyResult {
    pub report: RunReport,
    /// 失败时为原文
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Default)]
pub struct OrthographyOutputs {
    pub corrected: Vec<Page>,
    /// 校对失败、保留原文的页
    pub degraded_pages: Vec<i64>,
}

struct CorrectPages {
    llm: Arc<dyn LlmPort>,
}

#[async_trait]
impl Stage<OrthographyOutputs> for CorrectPages {
    fn name(&self) -> &'static str {
        "correct_pages"
    }

    async fn run(
        &self,
        state: &WorkflowState<OrthographyOutputs>,
    ) -> Result<WorkflowState<OrthographyOutputs>, WorkflowError> {
        let llm = self.llm.as_ref();
        let language = state.language();
        let model = state.model.as_str();

        let results = fan_out_pages(
            &state.pages,
            |page| correct_page(llm, model, language, page),
            |page, _| page.clone(),
        )
        .await;

        Ok(state.with_outputs(|o| {
            o.degraded_pages = results.iter().filter(|r| r.degraded).map(|r| r.page_key).collect();
            o.corrected = results.into_iter().map(|r| r.value).collect();
        }))
    }
}

struct RefineContext {
    llm: Arc<dyn LlmPort>,
}

#[async_trait]
impl Stage<OrthographyOutputs> for RefineContext {
    fn name(&self) -> &'static str {
        "refine_context"
    }

    async fn run(
        &self,
        state: &WorkflowState<OrthographyOutputs>,
    ) -> Result<WorkflowState<OrthographyOutputs>, WorkflowError> {
        let pages = &state.outputs.corrected;
        // 单页没有上下文可用
        if pages.len() < 2 {
            return Ok(state.clone());
        }

        let llm = self.llm.as_ref();
        let language = state.language();
        let model = state.model.as_str();

        let results = fan_out_pages(
            pages,
            |page| {
                let index = pages.iter().position(|p| p.page_key == page.page_key);
                let previous = index.and_then(|i| i.checked_sub(1)).and_then(|i| pages.get(i));
                let next = index.and_then(|i| pages.get(i + 1));
                refine_page(llm, model, language, page, previous, next)
            },
            |page, _| page.clone(),
        )
        .await;

        Ok(state.with_outputs(|o| {
            o.corrected = results.into_iter().map(|r| r.value).collect();
        }))
    }
}

struct Assemble;

#[async_trait]
impl Stage<OrthographyOutputs> for Assemble {
    fn name(&self) -> &'static str {
        "assemble"
    }

    async fn run(
        &self,
        state: &WorkflowState<OrthographyOutputs>,
    ) -> Result<WorkflowState<OrthographyOutputs>, WorkflowError> {
        let degraded = &state.outputs.degraded_pages;
        if degraded.is_empty() {
            return Ok(state.clone());
        }
        Ok(state.with_error(format!(
            "{} of {} pages kept their original text: {:?}",
            degraded.len(),
            state.pages.len(),
            degraded
        )))
    }
}

/// 校对服务
pub struct OrthographyWorkflow {
    graph: WorkflowGraph<OrthographyOutputs>,
}

impl OrthographyWorkflow {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        let graph = WorkflowGraph::new("orthography")
            .then(DetectLanguage::new(llm.clone()))
            .then(CorrectPages { llm: llm.clone() })
            .then(RefineContext { llm })
            .then(Assemble);
        Self { graph }
    }

    pub async fn run(&self, request: OrthographyRequest) -> OrthographyResult {
        let state = WorkflowState::new(request.pages, request.model, request.language);
        let run = self.graph.execute(state).await;
        let report = RunReport::from_run(&run);

        let pages = if run.state.outputs.corrected.is_empty() {
            run.state.pages
        } else {
            run.state.outputs.corrected
        };
        OrthographyResult { report, pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::LlmError;
    use crate::infrastructure::adapters::FakeLlmClient;

    fn request(pages: Vec<Page>) -> OrthographyRequest {
        OrthographyRequest {
            pages,
            model: "gpt-4o-mini".to_string(),
            language: Some(Language::English),
        }
    }

    #[tokio::test]
    async fn test_pages_corrected_and_sorted() {
        let llm = Arc::new(
            FakeLlmClient::new()
                .on("Correct spelling", r#"["fixed"]"#)
                .on("surrounding pages", r#"["refined"]"#),
        );
        let workflow = OrthographyWorkflow::new(llm);
        let result = workflow
            .run(request(vec![Page::from_strs(2, &["tpyo"]), Page::from_strs(1, &["eror"])]))
            .await;

        assert!(result.report.is_completed());
        assert_eq!(result.pages[0].page_key, 1);
        assert_eq!(result.pages[1].texts[0].text, "refined");
    }

    #[tokio::test]
    async fn test_failed_page_keeps_original_text() {
        let llm = Arc::new(
            FakeLlmClient::new().fail_on("Correct spelling", LlmError::ServiceError {
                status: 400,
                message: "bad".into(),
            }),
        );
        let workflow = OrthographyWorkflow::new(llm);
        let result = workflow.run(request(vec![Page::from_strs(1, &["eror"])])).await;

        assert!(!result.report.is_completed());
        assert_eq!(result.pages[0].texts[0].text, "eror");
        assert!(result.report.error.is_some());
    }
}
