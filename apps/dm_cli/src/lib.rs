// apps/dm_cli/src/lib.rs

//! DropMove 命令行工具
//!
//! # 架构层级
//!
//! 本 crate 属于 **Layer 5: Application**：
//! - 每个二进制只解析参数并调用 [`commands`] 中对应的 `execute`
//! - 诊断日志统一写到标准错误，标准输出只承载状态行与数据行
//! - 下层错误先汇入 `DmError`，再以 `anyhow` 携带上下文返回；
//!   [`finish`] 按错误类别选择退出码

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commands;
pub mod common;

pub use common::{exit_code, finish, CommonArgs};
