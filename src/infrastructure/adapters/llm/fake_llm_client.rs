//! Fake LLM Client - 用于测试和本地开发的 LLM 客户端
//!
//! 按提示词子串匹配预设回复，记录所有请求，可注入错误

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};

/// 一条预设规则：提示词包含 `matcher` 时依次返回 `replies`，最后一条重复使用
struct Rule {
    matcher: String,
    replies: VecDeque<Result<String, LlmError>>,
}

/// Fake LLM Client
#[derive(Default)]
pub struct FakeLlmClient {
    rules: Mutex<Vec<Rule>>,
    default_reply: Option<String>,
    calls: Mutex<Vec<LlmRequest>>,
}

impl FakeLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 没有规则匹配时的回复
    pub fn with_default(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = Some(reply.into());
        self
    }

    /// 提示词包含 `matcher` 时固定返回 `reply`
    pub fn on(self, matcher: impl Into<String>, reply: impl Into<String>) -> Self {
        self.on_sequence(matcher, vec![Ok(reply.into())])
    }

    /// 提示词包含 `matcher` 时返回错误
    pub fn fail_on(self, matcher: impl Into<String>, error: LlmError) -> Self {
        self.on_sequence(matcher, vec![Err(error)])
    }

    /// 提示词包含 `matcher` 时依次返回，用尽后重复最后一条
    pub fn on_sequence(
        self,
        matcher: impl Into<String>,
        replies: Vec<Result<String, LlmError>>,
    ) -> Self {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Rule {
                matcher: matcher.into(),
                replies: replies.into(),
            });
        }
        self
    }

    /// 已收到的全部请求
    pub fn calls(&self) -> Vec<LlmRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// 提示词包含 `matcher` 的请求数
    pub fn count_matching(&self, matcher: &str) -> usize {
        self.calls()
            .iter()
            .filter(|r| r.prompt.contains(matcher))
            .count()
    }

    fn next_reply(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let mut rules = self
            .rules
            .lock()
            .map_err(|_| LlmError::InvalidResponse("fake client poisoned".to_string()))?;

        let rule = rules.iter_mut().find(|rule| {
            request.prompt.contains(&rule.matcher)
                || request
                    .system
                    .as_deref()
                    .is_some_and(|s| s.contains(&rule.matcher))
        });

        match rule {
            Some(rule) if rule.replies.len() > 1 => rule
                .replies
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse)),
            Some(rule) => rule
                .replies
                .front()
                .cloned()
                .unwrap_or(Err(LlmError::EmptyResponse)),
            None => self
                .default_reply
                .clone()
                .ok_or_else(|| LlmError::InvalidResponse("no scripted reply".to_string())),
        }
    }
}

#[async_trait]
impl LlmPort for FakeLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let reply = self.next_reply(&request);
        tracing::debug!(
            model = %request.model,
            ok = reply.is_ok(),
            "FakeLlmClient: returning scripted reply"
        );

        reply.map(|content| LlmResponse {
            content,
            model: request.model,
        })
    }
}
