// crates/dm_io/src/error.rs

//! IO 错误类型定义
//!
//! 所有错误最终可转换为 `DmError` 以实现跨层错误传递。

use dm_foundation::DmError;
use dm_physics::PhysicsError;
use thiserror::Error;

use crate::checkpoint::CheckpointError;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 文件系统错误
    #[error("文件操作失败: {path}: {source}")]
    File {
        /// 路径
        path: String,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// 标准输出写入失败
    #[error("输出写入失败: {0}")]
    Output(#[from] std::io::Error),

    /// 检查点错误
    #[error("检查点错误: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// 状态重建失败
    #[error("状态重建失败: {0}")]
    Physics(#[from] PhysicsError),

    /// 体积分数总量为零，质心无定义
    #[error("体积分数总量为零，无法计算质心")]
    DegenerateConfiguration,

    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),
}

impl IoError {
    /// 构造带路径的文件错误
    pub fn file(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        IoError::File {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl From<IoError> for DmError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::File { path, source } => DmError::io_with_source(path, source),
            IoError::Output(source) => DmError::io_with_source("stdout", source),
            IoError::InvalidArgument(msg) => DmError::invalid_input(msg),
            IoError::Physics(e) => e.into(),
            other @ IoError::DegenerateConfiguration => DmError::numerical(other.to_string()),
            other => DmError::io(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_foundation_error() {
        let err: DmError = IoError::InvalidArgument("nx=0".into()).into();
        assert_eq!(err.exit_code(), 2);
        let err: DmError = IoError::DegenerateConfiguration.into();
        assert_eq!(err.exit_code(), 3);
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DmError = IoError::file("snapshot-0.1", missing).into();
        assert_eq!(err.exit_code(), 4);
    }
}
