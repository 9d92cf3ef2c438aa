// crates/dm_workflow/src/simulation.rs

//! 模拟驱动
//!
//! 准备输出目录、写入初始场（只做一次），然后逐步运行流水线直到某个阶段停止。

use std::time::Instant;

use dm_physics::FieldInitializer;

use crate::context::SimulationContext;
use crate::error::WorkflowResult;
use crate::monitor::GlobalDiagnostics;
use crate::pipeline::Pipeline;
use crate::verdict::{ControlSignal, Verdict};

/// 运行摘要
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// 已完成步数（含步 0）
    pub completed_steps: u64,
    /// 终止判定
    pub verdict: Verdict,
    /// 结束时的模拟时间
    pub final_time: f64,
    /// 最后一步的全局诊断量
    pub last: Option<GlobalDiagnostics>,
}

/// 模拟驱动
#[derive(Debug)]
pub struct Simulation {
    ctx: SimulationContext,
    pipeline: Pipeline,
}

impl Simulation {
    /// 使用标准流水线
    pub fn new(ctx: SimulationContext) -> Self {
        Self::with_pipeline(ctx, Pipeline::standard())
    }

    /// 使用自定义流水线
    pub fn with_pipeline(ctx: SimulationContext, pipeline: Pipeline) -> Self {
        Self { ctx, pipeline }
    }

    /// 上下文
    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// 运行到判定产生
    ///
    /// 致命判定以 [`crate::WorkflowError::StabilityViolation`] 返回，不输出状态行。
    pub fn run(mut self) -> WorkflowResult<RunSummary> {
        let start = Instant::now();
        let ctx = &mut self.ctx;

        ctx.prepare_outputs()?;
        FieldInitializer::new(ctx.params()).apply(ctx.engine_mut().state_mut());

        tracing::info!(
            "Run started: engine {}, Pe = {}, rank {}/{}, cells {}",
            ctx.engine().name(),
            ctx.params().peclet(),
            ctx.comm().rank(),
            ctx.comm().size(),
            ctx.engine().state().n_cells()
        );

        let verdict = loop {
            match self.pipeline.run_step(ctx) {
                Ok(ControlSignal::Continue) => ctx.clock_mut().next_step(),
                Ok(ControlSignal::Stop(verdict)) => break verdict,
                Err(e) => {
                    tracing::error!("Run failed at step {}: {}", ctx.clock().step, e);
                    return Err(e);
                }
            }
        };

        let summary = RunSummary {
            completed_steps: ctx.clock().step + 1,
            verdict,
            final_time: ctx.clock().time,
            last: ctx.last_diagnostics().copied(),
        };
        tracing::info!(
            "Run finished: {} after {} steps, t = {:.4} ({:.2}s)",
            summary.verdict,
            summary.completed_steps,
            summary.final_time,
            start.elapsed().as_secs_f64()
        );
        Ok(summary)
    }
}
