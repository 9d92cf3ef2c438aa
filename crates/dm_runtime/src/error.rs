// crates/dm_runtime/src/error.rs

//! 运行时错误类型
//!
//! 并行执行层的错误：集合通信载荷不一致、各工作者判定不一致等。

use dm_foundation::DmError;
use thiserror::Error;

/// 运行时结果类型
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// 运行时错误
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// 集合通信中各工作者提交的载荷长度不同
    #[error("集合通信载荷不一致: 期望长度 {expected}, 实际 {actual} (rank {rank})")]
    PayloadMismatch {
        /// 出错的 rank
        rank: usize,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 各工作者对同一决定给出了不同结果
    #[error("工作者判定不一致: {codes:?}")]
    Disagreement {
        /// 每个 rank 的判定码（按 rank 顺序）
        codes: Vec<u32>,
    },

    /// 无效的团队配置
    #[error("无效的团队配置: {0}")]
    InvalidTeam(String),
}

impl From<RuntimeError> for DmError {
    fn from(err: RuntimeError) -> Self {
        DmError::internal(err.to_string())
    }
}
