// crates/dm_workflow/src/pe_search.rs

//! 临界 Péclet 数搜索
//!
//! 迁移后下调 Pe，未迁移则上调；判定翻转时步长减半并记录临时临界值，
//! 步长小于容差时停止。结果为仍能迁移的最小 Pe，保留两位小数。
//!
//! ```text
//! Pe ──(MOVED)──> Pe - step ──(NOT_MOVED)──> 翻转: step /= 2 ──> Pe + step ...
//! ```

use dm_config::ConfigError;

use crate::error::{WorkflowError, WorkflowResult};
use crate::verdict::Verdict;

/// 一次评估
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Péclet 数
    pub peclet: f64,
    /// 是否迁移
    pub moved: bool,
}

/// 搜索结果
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// 临界 Pe（两位小数）
    pub critical_peclet: f64,
    /// 未取整的临界 Pe
    pub raw_critical_peclet: f64,
    /// 评估历史（按顺序）
    pub evaluations: Vec<Evaluation>,
}

/// 临界 Pe 搜索
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalPecletSearch {
    /// 起始 Pe
    pub start: f64,
    /// 初始步长
    pub step: f64,
    /// 步长容差
    pub tolerance: f64,
    /// Pe 下限
    pub min: f64,
    /// Pe 上限
    pub max: f64,
    /// 最大迭代次数
    pub max_iterations: usize,
}

impl Default for CriticalPecletSearch {
    fn default() -> Self {
        Self {
            start: 1.0,
            step: 0.5,
            tolerance: 0.005,
            min: 0.001,
            max: 100.0,
            max_iterations: 200,
        }
    }
}

impl CriticalPecletSearch {
    /// 指定起点与初始步长
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            start,
            step,
            ..Self::default()
        }
    }

    fn validate(&self) -> WorkflowResult<()> {
        if !(self.min > 0.0 && self.min < self.max && self.max.is_finite()) {
            return Err(ConfigError::invalid(
                "pe_scan.bounds",
                format!("[{}, {}]", self.min, self.max),
                "bounds must satisfy 0 < min < max",
            )
            .into());
        }
        if !(self.start.is_finite() && self.start > 0.0) {
            return Err(ConfigError::invalid("pe_scan.start", self.start, "must be positive").into());
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(ConfigError::invalid("pe_scan.step", self.step, "must be positive").into());
        }
        if !(self.tolerance > 0.0) {
            return Err(
                ConfigError::invalid("pe_scan.tolerance", self.tolerance, "must be positive").into(),
            );
        }
        Ok(())
    }

    /// 运行搜索
    ///
    /// `oracle` 对给定 Pe 执行一次模拟，必须返回 `Moved` 或 `NotMoved`。
    pub fn run<F>(&self, mut oracle: F) -> WorkflowResult<SearchOutcome>
    where
        F: FnMut(f64) -> WorkflowResult<Verdict>,
    {
        self.validate()?;

        let mut evaluations = Vec::new();
        let mut evaluate = |pe: f64| -> WorkflowResult<bool> {
            let moved = match oracle(pe)? {
                Verdict::Moved => true,
                Verdict::NotMoved => false,
                other => {
                    return Err(WorkflowError::InvalidState(format!(
                        "Pe = {pe} produced verdict {other}"
                    )))
                }
            };
            tracing::info!("Pe={pe:.6} -> {}", if moved { "MOVED" } else { "not moved" });
            evaluations.push(Evaluation { peclet: pe, moved });
            Ok(moved)
        };

        let mut pe = self.start;
        let mut step = self.step;
        let mut moved = evaluate(pe)?;
        let mut critical = moved.then_some(pe);

        for _ in 0..self.max_iterations {
            let next = (if moved { pe - step } else { pe + step }).clamp(self.min, self.max);
            let moved_next = evaluate(next)?;

            if moved_next != moved {
                step *= 0.5;
                critical = Some(if moved_next { next } else { pe });
                tracing::info!("  flip -> step={step:.6}, provisional Pe_c={:.6}", critical.unwrap_or(pe));
                if step < self.tolerance {
                    break;
                }
            }

            pe = next;
            moved = moved_next;
        }

        let raw = critical.ok_or(WorkflowError::NoMovingRegime {
            min: self.min,
            max: self.max,
        })?;
        Ok(SearchOutcome {
            critical_peclet: (raw * 100.0).round() / 100.0,
            raw_critical_peclet: raw,
            evaluations,
        })
    }
}
