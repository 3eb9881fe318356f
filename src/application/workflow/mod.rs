//! 工作流引擎
//!
//! - state: 带版本的阶段状态
//! - graph: 线性阶段图执行器
//! - fan_out: 按页并发与合并

mod fan_out;
mod graph;
mod state;

pub use fan_out::{degraded_count, fan_out_pages, with_deadline, PageResult};
pub use graph::{format_elapsed, RunStatus, Stage, WorkflowGraph, WorkflowRun};
pub use state::{StageRecord, WorkflowState};
