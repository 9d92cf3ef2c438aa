// crates/dm_runtime/src/lib.rs

//! DropMove Runtime Layer (Layer 2)
//!
//! 并行执行层：工作者通信、写者角色分配与确定性归约。
//!
//! # 模块概览
//!
//! - [`communicator`]: `Communicator` trait、`LocalCommunicator`、`TeamCommunicator`
//! - [`reduce`]: 分区并行求和
//! - [`error`]: 运行时错误类型
//!
//! # 执行模型
//!
//! 同步、每步一次屏障：
//!
//! ```text
//! 引擎推进 ─> 全局归约 (all_gather) ─> 网格自适应 ─> 判定一致性 (agree)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod communicator;
pub mod error;
pub mod reduce;

pub use communicator::{Communicator, LocalCommunicator, Role, TeamCommunicator};
pub use error::{RuntimeError, RuntimeResult};
pub use reduce::{owned_range, partitioned_sum, DEFAULT_PARTITION_SIZE};
