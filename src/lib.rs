//! Storyloom - 把书籍文本转换为衍生媒体的工作流服务
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 页、语言、测验题、译文对齐、剧本、音效等纯逻辑
//!
//! 应用层 (application/):
//! - Ports: LLM、Embedding、VectorSearch、TTS、对象存储、音频探测
//! - Workflow: 阶段图执行器、按页并发、截止时间
//! - Agents / Prompts: 单页 agent 与提示词
//! - Workflows: 校对、测验题、歌词、剧本、翻译、摘要、音效
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Adapters: reqwest 客户端、对象存储、symphonia 时长探测、测试用 fake

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
