// crates/dm_mesh/src/error.rs

//! 网格处理错误类型
//!
//! 所有错误可转换为 `dm_foundation::DmError` 向上传播

use dm_foundation::DmError;
use thiserror::Error;

/// 网格模块结果类型
pub type MeshResult<T> = Result<T, MeshError>;

/// 网格错误枚举
#[derive(Error, Debug)]
pub enum MeshError {
    /// 叶单元集合不构成计算域的划分
    #[error("无效的叶单元划分: {0}")]
    InvalidPartition(String),

    /// 细化级别超出上限
    #[error("细化级别 {level} 超出上限 {max}")]
    LevelTooDeep {
        /// 请求的级别
        level: u8,
        /// 上限
        max: u8,
    },

    /// 场长度与叶单元数不一致
    #[error("场长度不匹配: {name} 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        /// 场名称
        name: &'static str,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },
}

impl MeshError {
    /// 检查场长度
    pub fn check_len(name: &'static str, expected: usize, actual: usize) -> MeshResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(MeshError::SizeMismatch {
                name,
                expected,
                actual,
            })
        }
    }
}

/// 转换到基础层错误
impl From<MeshError> for DmError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::SizeMismatch {
                name,
                expected,
                actual,
            } => DmError::size_mismatch(name, expected, actual),
            other => DmError::numerical(format!("网格错误: {other}")),
        }
    }
}
