// crates/dm_workflow/src/stages.rs

//! 逐步流水线的阶段
//!
//! 固定顺序：
//!
//! ```text
//! Coupling ─> Advance ─> Adaptation ─> Monitor ─> Snapshot ─> EndOfRun
//! ```
//!
//! 步 0 跳过 Advance，其余阶段照常运行，因此步 `i` 观察的是 `i` 次推进后的状态。

use dm_io::{RunStatus, TIME_EPS};
use dm_physics::PhysicsError;

use crate::context::SimulationContext;
use crate::error::{WorkflowError, WorkflowResult};
use crate::verdict::{ControlSignal, Verdict};

/// 流水线阶段
pub trait Stage {
    /// 阶段名称
    fn name(&self) -> &'static str;

    /// 在当前步执行
    fn run(&mut self, ctx: &mut SimulationContext) -> WorkflowResult<ControlSignal>;
}

/// 张力重新耦合
#[derive(Debug, Default)]
pub struct CouplingStage;

impl Stage for CouplingStage {
    fn name(&self) -> &'static str {
        "coupling"
    }

    fn run(&mut self, ctx: &mut SimulationContext) -> WorkflowResult<ControlSignal> {
        ctx.recouple();
        Ok(ControlSignal::Continue)
    }
}

/// 引擎推进
///
/// 步长上限为到下一个快照时刻（或 tmax）的剩余时间。
#[derive(Debug, Default)]
pub struct AdvanceStage;

impl AdvanceStage {
    /// 本步的目标时刻
    fn target(ctx: &SimulationContext) -> f64 {
        let tmax = ctx.tmax();
        ctx.snapshots()
            .schedule()
            .next_time()
            .map_or(tmax, |t| t.min(tmax))
    }
}

impl Stage for AdvanceStage {
    fn name(&self) -> &'static str {
        "advance"
    }

    fn run(&mut self, ctx: &mut SimulationContext) -> WorkflowResult<ControlSignal> {
        if ctx.clock().step == 0 {
            return Ok(ControlSignal::Continue);
        }

        let mut target = Self::target(ctx);
        if target - ctx.clock().time <= TIME_EPS {
            target = ctx.tmax();
        }
        let dt_limit = target - ctx.clock().time;

        let dt = ctx.advance_engine(dt_limit)?;
        if !(dt > 0.0 && dt <= dt_limit + TIME_EPS) {
            return Err(PhysicsError::InvalidTimeStep { dt, dt_limit }.into());
        }
        ctx.clock_mut().advance(dt, target);
        Ok(ControlSignal::Continue)
    }
}

/// 曲率计算与网格自适应
#[derive(Debug, Default)]
pub struct AdaptationStage;

impl Stage for AdaptationStage {
    fn name(&self) -> &'static str {
        "adaptation"
    }

    fn run(&mut self, ctx: &mut SimulationContext) -> WorkflowResult<ControlSignal> {
        let stats = ctx.adapt()?;
        tracing::trace!(
            "step {}: refined {}, coarsened {}, cells {}",
            ctx.clock().step,
            stats.refined,
            stats.coarsened,
            stats.n_cells
        );
        Ok(ControlSignal::Continue)
    }
}

/// 全局诊断与判定
#[derive(Debug, Default)]
pub struct MonitorStage;

impl Stage for MonitorStage {
    fn name(&self) -> &'static str {
        "monitor"
    }

    fn run(&mut self, ctx: &mut SimulationContext) -> WorkflowResult<ControlSignal> {
        let (diag, verdict) = ctx.observe()?;
        match verdict {
            Verdict::Continue => Ok(ControlSignal::Continue),
            Verdict::Moved => {
                ctx.emit_status(RunStatus::Moved)?;
                Ok(ControlSignal::Stop(Verdict::Moved))
            }
            Verdict::FatalInvariant => Err(WorkflowError::StabilityViolation {
                step: diag.step,
                kinetic_energy: diag.kinetic_energy,
                displacement: diag.displacement,
            }),
            Verdict::NotMoved => Err(WorkflowError::InvalidState(
                "判定器不应给出 NOT_MOVED".into(),
            )),
        }
    }
}

/// 周期快照
#[derive(Debug, Default)]
pub struct SnapshotStage;

impl Stage for SnapshotStage {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn run(&mut self, ctx: &mut SimulationContext) -> WorkflowResult<ControlSignal> {
        if let Some(path) = ctx.write_due_snapshot()? {
            tracing::debug!("Snapshot written: {}", path.display());
        }
        Ok(ControlSignal::Continue)
    }
}

/// 终止时间检查
#[derive(Debug, Default)]
pub struct EndOfRunStage;

impl Stage for EndOfRunStage {
    fn name(&self) -> &'static str {
        "end-of-run"
    }

    fn run(&mut self, ctx: &mut SimulationContext) -> WorkflowResult<ControlSignal> {
        let verdict = if ctx.clock().reached(ctx.tmax()) {
            Verdict::NotMoved
        } else {
            Verdict::Continue
        };
        ctx.comm().agree(verdict.code())?;

        if verdict == Verdict::NotMoved {
            ctx.emit_status(RunStatus::NotMoved)?;
            return Ok(ControlSignal::Stop(Verdict::NotMoved));
        }
        Ok(ControlSignal::Continue)
    }
}
