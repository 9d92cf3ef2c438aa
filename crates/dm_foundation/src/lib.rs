// crates/dm_foundation/src/lib.rs

//! DropMove Foundation Layer
//!
//! 基础层，提供整个项目共享的错误类型与数值工具。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`numerics`]: Kahan 求和等数值工具
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: dm_cli
//! Layer 4: dm_workflow, dm_io
//! Layer 3: dm_physics
//! Layer 2: dm_mesh, dm_config, dm_runtime
//! Layer 1: dm_foundation (本层)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod numerics;

// 重导出常用类型
pub use error::{DmError, DmResult};
pub use numerics::KahanSum;
