//! 按模型名路由到供应商，并统一做退避重试

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};
use crate::application::resilience::{retry_with_backoff, RetryPolicy};

/// 供应商
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Gemini,
}

impl LlmProvider {
    /// `gemini-*` 走 Gemini，其余走 OpenAI 兼容接口
    pub fn for_model(model: &str) -> Self {
        if model.trim().to_lowercase().starts_with("gemini") {
            LlmProvider::Gemini
        } else {
            LlmProvider::OpenAi
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Gemini => "gemini",
        }
    }
}

pub struct RoutedLlmClient {
    openai: Option<Arc<dyn LlmPort>>,
    gemini: Option<Arc<dyn LlmPort>>,
    policy: RetryPolicy,
}

impl RoutedLlmClient {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            openai: None,
            gemini: None,
            policy,
        }
    }

    pub fn with_openai(mut self, client: Arc<dyn LlmPort>) -> Self {
        self.openai = Some(client);
        self
    }

    pub fn with_gemini(mut self, client: Arc<dyn LlmPort>) -> Self {
        self.gemini = Some(client);
        self
    }

    fn client_for(&self, provider: LlmProvider) -> Option<&Arc<dyn LlmPort>> {
        match provider {
            LlmProvider::OpenAi => self.openai.as_ref(),
            LlmProvider::Gemini => self.gemini.as_ref(),
        }
    }
}

#[async_trait]
impl LlmPort for RoutedLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let provider = LlmProvider::for_model(&request.model);
        let client = self
            .client_for(provider)
            .ok_or_else(|| LlmError::UnsupportedModel(request.model.clone()))?;

        tracing::debug!(
            provider = provider.as_str(),
            model = %request.model,
            prompt_len = request.prompt.len(),
            "LLM request"
        );

        retry_with_backoff(&self.policy, provider.as_str(), LlmError::retry_decision, |_| {
            client.generate(request.clone())
        })
        .await
        .map_err(|e| e.into_last_error())
    }
}
