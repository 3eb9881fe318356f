//! 单页 Agent
//!
//! 每个 agent 针对一页（或一段文本）发起一次外部调用，彼此之间无共享状态。
//! 网络层面的重试由适配器完成，这里只处理模型输出格式错误的重试。

pub mod audio;
pub mod language;
pub mod lyrics;
pub mod orthography;
pub mod play;
pub mod quiz;
pub mod sound;
pub mod summary;
pub mod translator;

use std::fmt;
use std::time::Duration;

use crate::application::error::WorkflowError;
use crate::application::ports::{LlmError, LlmPort, LlmRequest};
use crate::application::resilience::{retry_with_backoff, RetryDecision, RetryPolicy};

/// 模型输出格式错误时的默认尝试次数
pub const DEFAULT_PARSE_ATTEMPTS: u32 = 2;

const PARSE_RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug)]
enum CallError {
    Llm(LlmError),
    Malformed(String),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Llm(e) => write!(f, "{}", e),
            CallError::Malformed(e) => write!(f, "malformed model output: {}", e),
        }
    }
}

/// 调用 LLM 并用 `parse` 解析回复，解析失败时重新生成，最多 `attempts` 次
pub(crate) async fn generate_parsed<T, P>(
    llm: &dyn LlmPort,
    request: LlmRequest,
    attempts: u32,
    agent: &'static str,
    parse: P,
) -> Result<T, WorkflowError>
where
    P: Fn(&str) -> Result<T, String>,
{
    let policy = RetryPolicy::none().with_transient(attempts.saturating_sub(1), PARSE_RETRY_DELAY);
    let parse = &parse;
    let request = &request;

    retry_with_backoff(
        &policy,
        agent,
        |e: &CallError| match e {
            CallError::Llm(_) => RetryDecision::Fail,
            CallError::Malformed(_) => RetryDecision::RetryTransient,
        },
        |_| async move {
            let response = llm.generate(request.clone()).await.map_err(CallError::Llm)?;
            parse(&response.content).map_err(CallError::Malformed)
        },
    )
    .await
    .map_err(|e| WorkflowError::agent(agent, e.into_last_error()))
}

/// 纯文本生成，空回复视为错误
pub(crate) async fn generate_text(
    llm: &dyn LlmPort,
    request: LlmRequest,
    agent: &'static str,
) -> Result<String, WorkflowError> {
    generate_parsed(llm, request, DEFAULT_PARSE_ATTEMPTS, agent, |content| {
        let text = content.trim();
        if text.is_empty() {
            Err("empty reply".to_string())
        } else {
            Ok(text.to_string())
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeLlmClient;

    #[tokio::test(start_paused = true)]
    async fn test_generate_parsed_retries_malformed_output() {
        let llm = FakeLlmClient::new().on_sequence(
            "number",
            vec![Ok("not a number".into()), Ok("42".into())],
        );
        let value = generate_parsed(&llm, LlmRequest::new("m", "give a number"), 2, "test", |c| {
            c.trim().parse::<u32>().map_err(|e| e.to_string())
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(llm.count_matching("number"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_parsed_does_not_retry_llm_errors() {
        let llm = FakeLlmClient::new().fail_on("x", LlmError::QuotaExceeded("q".into()));
        let result = generate_parsed(&llm, LlmRequest::new("m", "x"), 3, "test", |c| {
            Ok::<_, String>(c.to_string())
        })
        .await;

        assert!(matches!(result, Err(WorkflowError::Agent { agent: "test", .. })));
        assert_eq!(llm.calls().len(), 1);
    }
}
