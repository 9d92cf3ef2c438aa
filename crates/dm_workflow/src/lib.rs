// crates/dm_workflow/src/lib.rs

//! DropMove Workflow Layer (Layer 4)
//!
//! 逐步控制流：张力耦合、引擎推进、网格自适应、稳定性判定、快照与终止检查。
//!
//! # 模块概览
//!
//! - [`clock`]: 模拟时钟
//! - [`verdict`]: 终止判定与控制信号
//! - [`monitor`]: 全局诊断、判定器与稳定性监控
//! - [`collective`]: 写者本地操作的集合收尾
//! - [`context`]: 模拟上下文
//! - [`stages`]: 流水线阶段
//! - [`pipeline`]: 静态有序流水线
//! - [`simulation`]: 模拟驱动
//! - [`pe_search`]: 临界 Pe 搜索
//!
//! # 每步流程
//!
//! ```text
//! ┌──────────┐  ┌─────────┐  ┌────────────┐  ┌─────────┐  ┌──────────┐  ┌───────────┐
//! │ Coupling │─>│ Advance │─>│ Adaptation │─>│ Monitor │─>│ Snapshot │─>│ EndOfRun  │
//! └──────────┘  └─────────┘  └────────────┘  └─────────┘  └──────────┘  └───────────┘
//!                (步 0 跳过)                  MOVED/FATAL                 NOT_MOVED
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod collective;
pub mod context;
pub mod error;
pub mod monitor;
pub mod pe_search;
pub mod pipeline;
pub mod simulation;
pub mod stages;
pub mod verdict;

pub use clock::SimulationClock;
pub use collective::settle;
pub use context::{SimulationContext, StatusSink};
pub use error::{WorkflowError, WorkflowResult};
pub use monitor::{Classifier, GlobalDiagnostics, StabilityMonitor};
pub use pe_search::{CriticalPecletSearch, Evaluation, SearchOutcome};
pub use pipeline::Pipeline;
pub use simulation::{RunSummary, Simulation};
pub use stages::{
    AdaptationStage, AdvanceStage, CouplingStage, EndOfRunStage, MonitorStage, SnapshotStage,
    Stage,
};
pub use verdict::{ControlSignal, Verdict};
