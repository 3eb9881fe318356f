//! 应用层错误定义
//!
//! - `WorkflowError`: 阶段内错误，由执行器捕获并写入状态
//! - `ApplicationError`: 用例边界错误，HTTP 层据此决定 errno

use thiserror::Error;

use crate::application::ports::LlmError;

/// 工作流阶段错误
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// 译文重试耗尽仍不满足数量约束
    #[error("Translation failed: {0}")]
    Translation(String),

    /// 输入或中间结果不满足约束
    #[error("Validation error: {0}")]
    Validation(String),

    /// 没有任何候选题通过校验
    #[error("No valid quiz generated ({rejected} of {candidates} candidates rejected)")]
    NoValidQuiz { candidates: usize, rejected: usize },

    /// 单个 agent 调用失败
    #[error("Agent {agent} failed: {message}")]
    Agent { agent: &'static str, message: String },

    /// 超过截止时间
    #[error("Deadline of {secs}s exceeded")]
    Timeout { secs: u64 },

    /// 阶段内部错误（含 panic）
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn agent(agent: &'static str, message: impl ToString) -> Self {
        Self::Agent {
            agent,
            message: message.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<LlmError> for WorkflowError {
    fn from(err: LlmError) -> Self {
        Self::agent("llm", err)
    }
}

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误（请求不合法）
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 工作流错误
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<LlmError> for ApplicationError {
    fn from(err: LlmError) -> Self {
        Self::ExternalServiceError(err.to_string())
    }
}
