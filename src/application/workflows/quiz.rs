//! 测验题工作流
//!
//! detect_language → generate_candidates → validate_candidates → select_quizzes

use std::sync::Arc;

use async_trait::async_trait;

use super::common::{DetectLanguage, RunReport};
use crate::application::agents::quiz::generate_candidates;
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::workflow::{Stage, WorkflowGraph, WorkflowState};
use crate::domain::page::full_text;
use crate::domain::quiz::{candidate_count, select_quizzes, validate_candidates};
use crate::domain::{Language, Page, ProblemType, Quiz, QuizCandidate};

#[derive(Debug, Clone)]
pub struct QuizRequest {
    pub pages: Vec<Page>,
    pub model: String,
    pub language: Option<Language>,
    pub count: usize,
    /// 为空表示不限题型
    pub problem_types: Vec<ProblemType>,
}

#[derive(Debug, Clone)]
pub struct QuizResult {
    pub report: RunReport,
    pub quizzes: Vec<Quiz>,
}

#[derive(Debug, Clone, Default)]
pub struct QuizOutputs {
    pub target: usize,
    pub problem_types: Vec<ProblemType>,
    pub candidates: Vec<QuizCandidate>,
    pub valid: Vec<Quiz>,
    pub rejected: usize,
    pub quizzes: Vec<Quiz>,
}

struct GenerateCandidates {
    llm: Arc<dyn LlmPort>,
}

#[async_trait]
impl Stage<QuizOutputs> for GenerateCandidates {
    fn name(&self) -> &'static str {
        "generate_candidates"
    }

    async fn run(&self, state: &WorkflowState<QuizOutputs>) -> Result<WorkflowState<QuizOutputs>, WorkflowError> {
        let outputs = &state.outputs;
        let text = full_text(&state.pages);
        if text.trim().is_empty() {
            return Err(WorkflowError::validation("no text to generate quizzes from"));
        }

        let count = candidate_count(outputs.target, !outputs.problem_types.is_empty());
        let candidates = generate_candidates(
            self.llm.as_ref(),
            &state.model,
            state.language(),
            &text,
            count,
            &outputs.problem_types,
        )
        .await?;

        Ok(state.with_outputs(|o| o.candidates = candidates))
    }
}

struct ValidateCandidates;

#[async_trait]
impl Stage<QuizOutputs> for ValidateCandidates {
    fn name(&self) -> &'static str {
        "validate_candidates"
    }

    async fn run(&self, state: &WorkflowState<QuizOutputs>) -> Result<WorkflowState<QuizOutputs>, WorkflowError> {
        let outputs = &state.outputs;
        // 只请求了一种题型时，缺失题型的候选题按该题型处理
        let fallback_type = match outputs.problem_types.as_slice() {
            [only] => Some(*only),
            _ => None,
        };

        let (valid, rejected) = validate_candidates(&outputs.candidates, fallback_type);
        tracing::info!(
            candidates = outputs.candidates.len(),
            valid = valid.len(),
            rejected = rejected,
            "Quiz candidates validated"
        );

        if valid.is_empty() {
            return Err(WorkflowError::NoValidQuiz {
                candidates: outputs.candidates.len(),
                rejected,
            });
        }

        Ok(state.with_outputs(|o| {
            o.valid = valid;
            o.rejected = rejected;
        }))
    }
}

struct SelectQuizzes;

#[async_trait]
impl Stage<QuizOutputs> for SelectQuizzes {
    fn name(&self) -> &'static str {
        "select_quizzes"
    }

    async fn run(&self, state: &WorkflowState<QuizOutputs>) -> Result<WorkflowState<QuizOutputs>, WorkflowError> {
        let outputs = &state.outputs;
        let selected = select_quizzes(outputs.valid.clone(), outputs.target, &outputs.problem_types);

        let mut next = state.with_outputs(|o| o.quizzes = selected);
        if next.outputs.quizzes.len() < outputs.target {
            tracing::warn!(
                requested = outputs.target,
                selected = next.outputs.quizzes.len(),
                "Fewer valid quizzes than requested"
            );
            next.error = Some(format!(
                "only {} of {} quizzes could be generated",
                next.outputs.quizzes.len(),
                outputs.target
            ));
        }
        Ok(next)
    }
}

/// 测验题服务
pub struct QuizWorkflow {
    graph: WorkflowGraph<QuizOutputs>,
}

impl QuizWorkflow {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        let graph = WorkflowGraph::new("quiz")
            .then(DetectLanguage::new(llm.clone()))
            .then(GenerateCandidates { llm })
            .then(ValidateCandidates)
            .then(SelectQuizzes);
        Self { graph }
    }

    pub async fn run(&self, request: QuizRequest) -> QuizResult {
        let mut state: WorkflowState<QuizOutputs> =
            WorkflowState::new(request.pages, request.model, request.language);
        state.outputs.target = request.count;
        state.outputs.problem_types = request.problem_types;

        let run = self.graph.execute(state).await;
        QuizResult {
            report: RunReport::from_run(&run),
            quizzes: run.state.outputs.quizzes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeLlmClient;

    fn request(count: usize, problem_types: Vec<ProblemType>) -> QuizRequest {
        QuizRequest {
            pages: vec![Page::from_strs(1, &["The cat sat on the mat."])],
            model: "m".to_string(),
            language: Some(Language::English),
            count,
            problem_types,
        }
    }

    const REPLY: &str = r#"[
        {"question": "Did the cat sit?", "answer": "true", "problemType": 0, "options": ["true", "false"]},
        {"question": "Did the cat sit?", "answer": "O", "problemType": 0},
        {"question": "Where did the cat sit?", "answer": "mat", "problemType": 4, "options": ["mat", "bed", "mat", "roof", "car"]},
        {"question": "What sat?", "answer": "cat", "problemType": 2, "options": ["cat", "dog"]},
        {"answer": "missing question", "problemType": 0}
    ]"#;

    #[tokio::test]
    async fn test_quizzes_are_valid_and_distinct() {
        let llm = Arc::new(FakeLlmClient::new().on("quiz questions", REPLY));
        let result = QuizWorkflow::new(llm)
            .run(request(2, vec![ProblemType::Ox, ProblemType::Four]))
            .await;

        assert!(result.report.is_completed());
        assert_eq!(result.quizzes.len(), 2);
        assert_eq!(result.quizzes[0].answer, "O");
        assert_eq!(result.quizzes[1].options, vec!["mat", "bed", "roof", "car"]);
        for quiz in &result.quizzes {
            assert!(quiz.is_consistent());
        }
    }

    #[tokio::test]
    async fn test_requests_extra_candidates_for_types() {
        let llm = Arc::new(FakeLlmClient::new().on("quiz questions", REPLY));
        QuizWorkflow::new(llm.clone())
            .run(request(3, vec![ProblemType::Ox]))
            .await;
        assert!(llm.calls()[0].prompt.contains("Write 8"));
    }

    #[tokio::test]
    async fn test_no_valid_candidates_is_incompleted() {
        let llm = Arc::new(FakeLlmClient::new().on("quiz questions", r#"[{"answer": "x"}]"#));
        let result = QuizWorkflow::new(llm).run(request(2, vec![])).await;

        assert!(!result.report.is_completed());
        assert!(result.quizzes.is_empty());
        assert!(result.report.error.unwrap().contains("No valid quiz"));
    }
}
