// crates/dm_foundation/src/error.rs

//! 统一错误类型
//!
//! 各层 crate 定义自己的错误枚举，并在应用层边界通过 `From` 汇入 [`DmError`]。
//! 汇入后只保留错误类别，命令行工具据此选择退出码：
//!
//! ```text
//! 参数/配置错误 ─> 2
//! 数值/稳定性   ─> 3
//! 文件/输出     ─> 4
//! 其他          ─> 1
//! ```
//!
//! # 示例
//!
//! ```
//! use dm_foundation::error::{DmError, DmResult};
//!
//! fn load() -> DmResult<()> {
//!     Err(DmError::config("配置文件格式错误"))
//! }
//! assert_eq!(load().unwrap_err().exit_code(), 2);
//! ```

use thiserror::Error;

/// 统一结果类型
pub type DmResult<T> = Result<T, DmError>;

/// DropMove 错误类型
#[derive(Error, Debug)]
pub enum DmError {
    /// 文件或输出流错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述（通常为路径）
        message: String,
        /// 底层 IO 错误
        #[source]
        source: Option<std::io::Error>,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 说明
        message: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },

    /// 数值发散或不可恢复的物理状态
    #[error("数值错误: {0}")]
    Numerical(String),

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 说明
        message: String,
    },
}

impl DmError {
    /// 无源 IO 错误
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 带源 IO 错误
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 数值错误
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical(message.into())
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 进程退出码
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidInput { .. } | Self::Config { .. } | Self::InvalidConfig { .. } => 2,
            Self::Numerical(_) => 3,
            Self::Io { .. } => 4,
            Self::SizeMismatch { .. } | Self::Internal { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = DmError::invalid_config("pe", "-1", "必须为正");
        let msg = err.to_string();
        assert!(msg.contains("pe"));
        assert!(msg.contains("-1"));
    }

    #[test]
    fn test_io_source_kept() {
        use std::error::Error;
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = DmError::io_with_source("log.dat", io);
        assert!(err.source().is_some());
        assert!(DmError::io("stdout").source().is_none());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DmError::invalid_input("x").exit_code(), 2);
        assert_eq!(DmError::invalid_config("k", "v", "r").exit_code(), 2);
        assert_eq!(DmError::numerical("ke").exit_code(), 3);
        assert_eq!(DmError::io("log.dat").exit_code(), 4);
        assert_eq!(DmError::internal("x").exit_code(), 1);
        assert_eq!(DmError::size_mismatch("f", 1, 2).exit_code(), 1);
    }
}
