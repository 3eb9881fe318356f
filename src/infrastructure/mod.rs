//! Infrastructure Layer - 基础设施层
//!
//! - adapters: 端口的具体实现（reqwest 客户端、本地/HTTP 对象存储、音频探测、测试用 fake）
//! - http: axum 路由与 handler

pub mod adapters;
pub mod http;
