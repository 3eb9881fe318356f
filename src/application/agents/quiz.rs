//! 测验题生成 Agent

use serde_json::Value;

use crate::application::agents::{generate_parsed, DEFAULT_PARSE_ATTEMPTS};
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::prompts::quiz_prompt;
use crate::domain::json_payload::{extract_json_block, unwrap_array};
use crate::domain::{Language, ProblemType, QuizCandidate};

/// 解析候选题数组；单个元素格式不对时跳过，交给校验阶段统计
pub fn parse_candidates(content: &str) -> Result<Vec<QuizCandidate>, String> {
    let value: Value = serde_json::from_str(extract_json_block(content)).map_err(|e| e.to_string())?;
    let items = unwrap_array(value).ok_or_else(|| "quiz reply is not an array".to_string())?;
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<QuizCandidate>(item).ok())
        .collect())
}

/// 一次调用生成 `count` 道候选题
pub async fn generate_candidates(
    llm: &dyn LlmPort,
    model: &str,
    language: Language,
    text: &str,
    count: usize,
    types: &[ProblemType],
) -> Result<Vec<QuizCandidate>, WorkflowError> {
    let request = quiz_prompt(language, text, count, types).into_json_request(model);
    let candidates = generate_parsed(llm, request, DEFAULT_PARSE_ATTEMPTS, "quiz", |content| {
        let candidates = parse_candidates(content)?;
        if candidates.is_empty() {
            Err("no quiz candidates in reply".to_string())
        } else {
            Ok(candidates)
        }
    })
    .await?;

    tracing::info!(requested = count, received = candidates.len(), "Quiz candidates generated");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeLlmClient;

    #[test]
    fn test_parse_candidates_accepts_wrapped_array() {
        let raw = r#"{"quizzes": [{"question": "Q?", "answer": "O", "problemType": 0}, 5]}"#;
        let candidates = parse_candidates(raw).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].question.as_deref(), Some("Q?"));
    }

    #[tokio::test]
    async fn test_generate_candidates() {
        let llm = FakeLlmClient::new().on(
            "quiz questions",
            r#"[{"question": "Did the cat sit?", "answer": "true", "problemType": 0, "options": ["true", "false"]}]"#,
        );
        let candidates = generate_candidates(&llm, "m", Language::English, "The cat sat.", 8, &[ProblemType::Ox])
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(llm.calls()[0].prompt.contains("Write 8"));
    }
}
