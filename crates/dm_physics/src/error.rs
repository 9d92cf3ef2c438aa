// crates/dm_physics/src/error.rs

//! 物理层错误类型

use dm_foundation::DmError;
use dm_mesh::MeshError;
use thiserror::Error;

/// 物理层结果类型
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// 物理层错误
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// 网格错误
    #[error("网格错误: {0}")]
    Mesh(#[from] MeshError),

    /// 时间步无效
    #[error("无效的时间步: {dt} (上限 {dt_limit})")]
    InvalidTimeStep {
        /// 计算得到的时间步
        dt: f64,
        /// 调用方给出的上限
        dt_limit: f64,
    },

    /// 按名称查找场失败
    #[error("未知的场名称: {0}")]
    UnknownField(String),

    /// 状态不一致
    #[error("状态不一致: {0}")]
    InvalidState(String),
}

impl From<PhysicsError> for DmError {
    fn from(err: PhysicsError) -> Self {
        match err {
            PhysicsError::Mesh(e) => e.into(),
            other => DmError::numerical(other.to_string()),
        }
    }
}
