//! 各功能共用的阶段与结果包装

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::agents::language::detect_language;
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::workflow::{Stage, WorkflowRun, WorkflowState};
use crate::domain::Language;

/// 语言检测阶段；请求已指定语言时跳过
pub struct DetectLanguage {
    llm: Arc<dyn LlmPort>,
}

impl DetectLanguage {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl<T> Stage<T> for DetectLanguage
where
    T: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "detect_language"
    }

    async fn run(&self, state: &WorkflowState<T>) -> Result<WorkflowState<T>, WorkflowError> {
        let mut next = state.clone();
        if next.language.is_none() {
            let language = detect_language(self.llm.as_ref(), &state.model, &state.pages).await;
            tracing::info!(language = %language, "Language resolved");
            next.language = Some(language);
        }
        Ok(next)
    }
}

/// 对外状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    Completed,
    Incompleted,
}

impl CompletionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionState::Completed => "Completed",
            CompletionState::Incompleted => "Incompleted",
        }
    }
}

/// 每个功能结果都带的运行信息
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: CompletionState,
    /// `"{秒:.2}s"`
    pub execution_time: String,
    pub error: Option<String>,
    pub language: Option<Language>,
}

impl RunReport {
    pub fn from_run<T>(run: &WorkflowRun<T>) -> Self {
        let state = if run.is_completed() {
            CompletionState::Completed
        } else {
            CompletionState::Incompleted
        };
        Self {
            run_id: run.run_id,
            state,
            execution_time: run.execution_time(),
            error: run.state.error.clone(),
            language: run.state.language,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == CompletionState::Completed
    }
}
