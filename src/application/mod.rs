//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（LLM、Embedding、VectorSearch、TTS、对象存储、音频探测）
//! - resilience: 指数退避重试
//! - workflow: 阶段图执行器与按页并发
//! - agents: 单页 agent
//! - prompts: 提示词模板
//! - workflows: 各功能服务
//! - error: 应用层错误定义

pub mod agents;
pub mod error;
pub mod ports;
pub mod prompts;
pub mod resilience;
pub mod workflow;
pub mod workflows;

pub use error::{ApplicationError, WorkflowError};

pub use resilience::{retry_with_backoff, RetryDecision, RetryError, RetryPolicy};

pub use workflows::{
    CompletionState, LyricsRequest, OrthographyRequest, PlayRequest, QuizRequest, RunReport,
    SoundRequest, SummaryRequest, TranslationRequest, WorkflowPorts, WorkflowSettings, Workflows,
};
