// crates/dm_physics/src/engine.rs

//! 流动/界面求解引擎接口
//!
//! 驱动层只通过 [`Engine`] 与求解器交互：推进一步、计算曲率、执行网格自适应。
//! 曲率与自适应有基于 `dm_mesh` 的默认实现，引擎可按需覆盖。

use dm_config::PhysicalProperties;
use dm_mesh::{curvature_from_distance, AdaptStats};

use crate::error::PhysicsResult;
use crate::fields::{AdaptRequest, FieldKind, FlowState};

/// 求解引擎
pub trait Engine: Send {
    /// 引擎名称
    fn name(&self) -> &str;

    /// 当前状态
    fn state(&self) -> &FlowState;

    /// 可变状态
    fn state_mut(&mut self) -> &mut FlowState;

    /// 推进一步，实际步长不超过 `dt_limit`，返回实际步长
    ///
    /// 调用前张力场已按当前浓度重新耦合。
    fn advance(&mut self, props: &PhysicalProperties, dt_limit: f64) -> PhysicsResult<f64>;

    /// 由距离场计算曲率并写入 [`FieldKind::Curvature`]
    fn curvature_from_distance(&mut self) -> PhysicsResult<()> {
        let state = self.state_mut();
        let kappa = curvature_from_distance(state.mesh(), state.field(FieldKind::Distance));
        state.fields_mut().replace(FieldKind::Curvature, kappa);
        Ok(())
    }

    /// 执行网格自适应
    fn adapt(&mut self, request: &AdaptRequest) -> PhysicsResult<AdaptStats> {
        self.state_mut().adapt(request)
    }
}
