//! 线性阶段图执行器
//!
//! 阶段严格按顺序执行。阶段返回 `Err` 或 panic 时，执行器记录日志、
//! 把错误写入最后一个成功状态并停止，不回滚之前阶段的结果。

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::FutureExt;
use uuid::Uuid;

use super::state::{StageRecord, WorkflowState};
use crate::application::error::WorkflowError;

/// 工作流阶段
#[async_trait]
pub trait Stage<T>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &WorkflowState<T>) -> Result<WorkflowState<T>, WorkflowError>;
}

/// 运行结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Error,
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct WorkflowRun<T> {
    /// 日志关联用
    pub run_id: Uuid,
    pub status: RunStatus,
    pub state: WorkflowState<T>,
    pub failed_stage: Option<&'static str>,
    pub elapsed: Duration,
}

impl<T> WorkflowRun<T> {
    /// 全部阶段成功且没有软错误
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed && self.state.error.is_none()
    }

    /// `"{秒:.2}s"`
    pub fn execution_time(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

/// 线性阶段图
pub struct WorkflowGraph<T> {
    name: &'static str,
    stages: Vec<Box<dyn Stage<T>>>,
}

impl<T> WorkflowGraph<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stages: Vec::new(),
        }
    }

    /// 追加一个阶段
    pub fn then(mut self, stage: impl Stage<T> + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn execute(&self, initial: WorkflowState<T>) -> WorkflowRun<T> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let mut state = initial;

        tracing::info!(
            workflow = self.name,
            run_id = %run_id,
            pages = state.pages.len(),
            model = %state.model,
            "Workflow started"
        );

        for stage in &self.stages {
            let stage_name = stage.name();
            let stage_started = Instant::now();

            let outcome = AssertUnwindSafe(stage.run(&state)).catch_unwind().await;
            let result = match outcome {
                Ok(result) => result,
                Err(panic) => Err(WorkflowError::Internal(panic_message(panic.as_ref()))),
            };

            match result {
                Ok(mut next) => {
                    let elapsed_ms = stage_started.elapsed().as_millis() as u64;
                    next.version = state.version + 1;
                    next.trail.push(StageRecord {
                        name: stage_name,
                        elapsed_ms,
                    });
                    if let Some(error) = &next.error {
                        tracing::warn!(
                            workflow = self.name,
                            run_id = %run_id,
                            stage = stage_name,
                            error = %error,
                            "Stage reported degraded result"
                        );
                    } else {
                        tracing::debug!(
                            workflow = self.name,
                            run_id = %run_id,
                            stage = stage_name,
                            elapsed_ms = elapsed_ms,
                            "Stage completed"
                        );
                    }
                    state = next;
                }
                Err(e) => {
                    tracing::error!(
                        workflow = self.name,
                        run_id = %run_id,
                        stage = stage_name,
                        error = %e,
                        "Stage failed, returning partial state"
                    );
                    state.error = Some(e.to_string());
                    return WorkflowRun {
                        run_id,
                        status: RunStatus::Error,
                        state,
                        failed_stage: Some(stage_name),
                        elapsed: started.elapsed(),
                    };
                }
            }
        }

        let elapsed = started.elapsed();
        tracing::info!(
            workflow = self.name,
            run_id = %run_id,
            elapsed = %format_elapsed(elapsed),
            degraded = state.error.is_some(),
            "Workflow finished"
        );

        WorkflowRun {
            run_id,
            status: RunStatus::Completed,
            state,
            failed_stage: None,
            elapsed,
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("stage panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("stage panicked: {}", s)
    } else {
        "stage panicked".to_string()
    }
}
