//! 工作流状态
//!
//! 每个阶段接收上一版状态的只读引用，返回新状态；执行器负责递增 `version` 并记录轨迹。

use crate::domain::page::{sort_pages, Page};
use crate::domain::Language;

/// 已完成阶段的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub name: &'static str,
    pub elapsed_ms: u64,
}

/// 一次工作流运行的状态
///
/// `T` 是各功能自己的阶段产物结构
#[derive(Debug, Clone)]
pub struct WorkflowState<T> {
    /// 按 pageKey 升序
    pub pages: Vec<Page>,
    pub model: String,
    /// 请求指定或检测得到的语言
    pub language: Option<Language>,
    pub outputs: T,
    /// 阶段写入的软错误，后续阶段据此降级
    pub error: Option<String>,
    pub version: u32,
    pub trail: Vec<StageRecord>,
}

impl<T: Default> WorkflowState<T> {
    pub fn new(mut pages: Vec<Page>, model: impl Into<String>, language: Option<Language>) -> Self {
        sort_pages(&mut pages);
        Self {
            pages,
            model: model.into(),
            language,
            outputs: T::default(),
            error: None,
            version: 0,
            trail: Vec::new(),
        }
    }
}

impl<T: Clone> WorkflowState<T> {
    /// 复制当前状态并修改产物
    pub fn with_outputs(&self, update: impl FnOnce(&mut T)) -> Self {
        let mut next = self.clone();
        update(&mut next.outputs);
        next
    }

    /// 复制当前状态并写入软错误
    pub fn with_error(&self, error: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.error = Some(error.into());
        next
    }
}

impl<T> WorkflowState<T> {
    /// 当前语言，未检测时按英文处理
    pub fn language(&self) -> Language {
        self.language.unwrap_or(Language::English)
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
