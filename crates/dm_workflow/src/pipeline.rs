// crates/dm_workflow/src/pipeline.rs

//! 静态有序的阶段流水线

use crate::context::SimulationContext;
use crate::error::WorkflowResult;
use crate::stages::{
    AdaptationStage, AdvanceStage, CouplingStage, EndOfRunStage, MonitorStage, SnapshotStage,
    Stage,
};
use crate::verdict::ControlSignal;

/// 阶段流水线
///
/// 每步按注册顺序运行各阶段，第一个 `Stop` 结束本步及整个运行。
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.stage_names()).finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    /// 空流水线
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// 标准六阶段流水线
    pub fn standard() -> Self {
        Self::empty()
            .with_stage(CouplingStage)
            .with_stage(AdvanceStage)
            .with_stage(AdaptationStage)
            .with_stage(MonitorStage)
            .with_stage(SnapshotStage)
            .with_stage(EndOfRunStage)
    }

    /// 追加阶段
    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// 阶段名称（按执行顺序）
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// 执行一步
    pub fn run_step(&mut self, ctx: &mut SimulationContext) -> WorkflowResult<ControlSignal> {
        for stage in &mut self.stages {
            if let ControlSignal::Stop(verdict) = stage.run(ctx)? {
                tracing::debug!("Stage '{}' stopped the run: {}", stage.name(), verdict);
                return Ok(ControlSignal::Stop(verdict));
            }
        }
        Ok(ControlSignal::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        assert_eq!(
            Pipeline::standard().stage_names(),
            vec!["coupling", "advance", "adaptation", "monitor", "snapshot", "end-of-run"]
        );
    }
}
