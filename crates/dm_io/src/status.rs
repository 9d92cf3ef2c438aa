// crates/dm_io/src/status.rs

//! 运行结果状态行
//!
//! 每次运行恰好输出一行 `STATUS MOVED` 或 `STATUS NOT_MOVED`，并立即刷新。

use std::io::Write;

use crate::error::{IoError, IoResult};

/// 运行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// 液滴发生迁移
    Moved,
    /// 到达 tmax 仍未迁移
    NotMoved,
}

impl RunStatus {
    /// 状态行文本
    pub fn token(self) -> &'static str {
        match self {
            RunStatus::Moved => "STATUS MOVED",
            RunStatus::NotMoved => "STATUS NOT_MOVED",
        }
    }

    /// 解析状态行
    pub fn parse(line: &str) -> Option<RunStatus> {
        match line.trim() {
            "STATUS MOVED" => Some(RunStatus::Moved),
            "STATUS NOT_MOVED" => Some(RunStatus::NotMoved),
            _ => None,
        }
    }
}

/// 状态行输出器
#[derive(Debug)]
pub struct StatusEmitter<W: Write> {
    out: W,
    emitted: Option<RunStatus>,
}

impl StatusEmitter<std::io::Stdout> {
    /// 输出到标准输出
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> StatusEmitter<W> {
    /// 包装任意输出
    pub fn new(out: W) -> Self {
        Self { out, emitted: None }
    }

    /// 已输出的状态
    pub fn emitted(&self) -> Option<RunStatus> {
        self.emitted
    }

    /// 输出状态行，一次运行只允许一次
    pub fn emit(&mut self, status: RunStatus) -> IoResult<()> {
        if let Some(previous) = self.emitted {
            return Err(IoError::InvalidArgument(format!(
                "状态已输出 ({}), 拒绝再次输出 {}",
                previous.token(),
                status.token()
            )));
        }
        writeln!(self.out, "{}", status.token())?;
        self.out.flush()?;
        self.emitted = Some(status);
        Ok(())
    }

    /// 取回底层输出
    pub fn into_inner(self) -> W {
        self.out
    }
}
