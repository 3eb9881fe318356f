//! Application State
//!
//! 路由共享的功能服务与请求默认值

use crate::application::Workflows;

/// 应用状态
pub struct AppState {
    pub workflows: Workflows,
    /// 请求未指定 model 时使用
    pub default_model: String,
}

impl AppState {
    pub fn new(workflows: Workflows, default_model: impl Into<String>) -> Self {
        Self {
            workflows,
            default_model: default_model.into(),
        }
    }
}
