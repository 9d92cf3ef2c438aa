// crates/dm_physics/src/reference/timestep.rs

//! 时间步长控制
//!
//! 取以下各项的最小值：
//!
//! - 调用方上限 `dt_limit`（快照时刻、tmax）
//! - 配置上限 `dt_max`
//! - CFL 条件 `C · h_min / |u|_max`
//! - 毛细波条件 `sqrt(rho h_min³ / (2π sigma_max))`

use dm_config::PhysicalProperties;
use rayon::prelude::*;

use crate::error::{PhysicsError, PhysicsResult};
use crate::fields::{FieldKind, FlowState};

/// 低于此速度视为静止
const MIN_SPEED: f64 = 1e-12;

/// 时间步控制器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeStepController {
    cfl: f64,
    dt_max: f64,
}

impl TimeStepController {
    /// 创建控制器
    pub fn new(cfl: f64, dt_max: f64) -> Self {
        Self { cfl, dt_max }
    }

    /// 计算本步步长
    pub fn compute(
        &self,
        state: &FlowState,
        props: &PhysicalProperties,
        dt_limit: f64,
    ) -> PhysicsResult<f64> {
        // NaN 经 min 会变成 dt_max，须先拒绝
        if dt_limit.is_nan() || dt_limit <= 0.0 {
            return Err(PhysicsError::InvalidTimeStep {
                dt: dt_limit,
                dt_limit,
            });
        }

        let h = state.mesh().min_cell_size();
        let u = state.field(FieldKind::VelocityX).as_slice();
        let v = state.field(FieldKind::VelocityY).as_slice();

        let max_speed = u
            .par_iter()
            .zip(v.par_iter())
            .map(|(a, b)| (a * a + b * b).sqrt())
            .reduce(|| 0.0, f64::max);

        let mut dt = dt_limit.min(self.dt_max);
        if max_speed > MIN_SPEED {
            dt = dt.min(self.cfl * h / max_speed);
        }

        let sigma_max = state.field(FieldKind::Tension).max_abs();
        if sigma_max > 0.0 {
            let rho = props.rho1.min(props.rho2);
            dt = dt.min((rho * h * h * h / (2.0 * std::f64::consts::PI * sigma_max)).sqrt());
        }

        if dt.is_finite() && dt > 0.0 {
            Ok(dt)
        } else {
            Err(PhysicsError::InvalidTimeStep { dt, dt_limit })
        }
    }
}
