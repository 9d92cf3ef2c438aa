// crates/dm_workflow/src/verdict.rs

//! 终止判定与阶段控制信号

use dm_io::RunStatus;

/// 终止判定
///
/// 每次运行恰好产生一个非 `Continue` 判定，并以它结束。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// 继续
    Continue,
    /// 液滴迁移
    Moved,
    /// 到达 tmax 仍未迁移
    NotMoved,
    /// 稳定性不变量被破坏
    FatalInvariant,
}

impl Verdict {
    /// 集合通信中使用的判定码
    pub fn code(self) -> u32 {
        match self {
            Verdict::Continue => 0,
            Verdict::Moved => 1,
            Verdict::NotMoved => 2,
            Verdict::FatalInvariant => 3,
        }
    }

    /// 由判定码恢复
    pub fn from_code(code: u32) -> Option<Verdict> {
        match code {
            0 => Some(Verdict::Continue),
            1 => Some(Verdict::Moved),
            2 => Some(Verdict::NotMoved),
            3 => Some(Verdict::FatalInvariant),
            _ => None,
        }
    }

    /// 是否结束运行
    pub fn is_terminal(self) -> bool {
        !matches!(self, Verdict::Continue)
    }

    /// 对应的状态行；`Continue` 与致命判定不输出
    pub fn status(self) -> Option<RunStatus> {
        match self {
            Verdict::Moved => Some(RunStatus::Moved),
            Verdict::NotMoved => Some(RunStatus::NotMoved),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Continue => "CONTINUE",
            Verdict::Moved => "MOVED",
            Verdict::NotMoved => "NOT_MOVED",
            Verdict::FatalInvariant => "FATAL_INVARIANT",
        };
        write!(f, "{s}")
    }
}

/// 阶段返回的控制信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// 继续执行后续阶段
    Continue,
    /// 以给定判定结束运行
    Stop(Verdict),
}
