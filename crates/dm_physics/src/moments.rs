// crates/dm_physics/src/moments.rs

//! 本地积分量：动能与体积分数矩
//!
//! ```text
//! ke   = Σ 0.5 · rho(f) · |u|² · h²
//! mass = Σ clamp(f, 0, 1)
//! mx   = Σ clamp(f, 0, 1) · x
//! my   = Σ clamp(f, 0, 1) · y
//! ```
//!
//! 求和通过 [`dm_runtime::partitioned_sum`] 完成，结果与线程调度无关。
//! 多工作者时每个工作者只对自己负责的单元区间（[`FlowMoments::over`]）求和，
//! 各自的本地值再经通信器归约。

use std::ops::Range;

use dm_config::PhysicalProperties;
use dm_runtime::{partitioned_sum, DEFAULT_PARTITION_SIZE};
use glam::DVec2;

use crate::fields::{FieldKind, FlowState};

/// 动能与体积分数矩
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowMoments {
    /// 动能
    pub kinetic_energy: f64,
    /// 体积分数和
    pub mass: f64,
    /// x 一阶矩
    pub moment_x: f64,
    /// y 一阶矩
    pub moment_y: f64,
}

impl FlowMoments {
    /// 分量个数（归约载荷长度）
    pub const LEN: usize = 4;

    /// 整个网格上的积分量
    pub fn local(state: &FlowState, props: &PhysicalProperties) -> Self {
        Self::over(state, props, 0..state.mesh().len())
    }

    /// 只对 `cells` 区间内的叶单元求和
    pub fn over(state: &FlowState, props: &PhysicalProperties, cells: Range<usize>) -> Self {
        let mesh = state.mesh();
        let f = state.field(FieldKind::Fraction);
        let u = state.field(FieldKind::VelocityX);
        let v = state.field(FieldKind::VelocityY);
        let end = cells.end.min(mesh.len());
        let start = cells.start.min(end);

        let sums = partitioned_sum::<4, _>(end - start, DEFAULT_PARTITION_SIZE, |i| {
            let k = start + i;
            let c = mesh.center(k);
            let w = f[k].clamp(0.0, 1.0);
            let ke = 0.5 * props.density(f[k]) * (u[k] * u[k] + v[k] * v[k]) * mesh.cell_area(k);
            [ke, w, w * c.x, w * c.y]
        });
        Self::from_array(sums)
    }

    /// 转为归约载荷
    pub fn to_array(&self) -> [f64; 4] {
        [self.kinetic_energy, self.mass, self.moment_x, self.moment_y]
    }

    /// 由归约载荷恢复
    pub fn from_array(values: [f64; 4]) -> Self {
        Self {
            kinetic_energy: values[0],
            mass: values[1],
            moment_x: values[2],
            moment_y: values[3],
        }
    }

    /// 体积分数加权质心；总量为零或非有限时返回 `None`
    pub fn centroid(&self) -> Option<DVec2> {
        if self.mass > 0.0 && self.mass.is_finite() {
            Some(DVec2::new(self.moment_x, self.moment_y) / self.mass)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_config::ParameterSet;
    use dm_mesh::{AdaptiveMesh, Domain};

    #[test]
    fn test_kinetic_energy() {
        let props = ParameterSet::with_peclet(1.0).unwrap().properties();
        let mut state = FlowState::new(AdaptiveMesh::uniform(Domain::centered(2.0), 2).unwrap());
        state.field_mut(FieldKind::VelocityX).fill(1.0);
        let m = FlowMoments::local(&state, &props);
        // 0.5 * 4 * 1 * 4(面积)
        assert!((m.kinetic_energy - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_ranges_add_up() {
        let props = ParameterSet::with_peclet(1.0).unwrap().properties();
        let mut state = FlowState::new(AdaptiveMesh::uniform(Domain::centered(2.0), 3).unwrap());
        state.field_mut(FieldKind::VelocityX).fill(1.0);
        state.field_mut(FieldKind::Fraction).fill(0.5);
        let n = state.mesh().len();
        let whole = FlowMoments::local(&state, &props);
        let a = FlowMoments::over(&state, &props, 0..n / 3);
        let b = FlowMoments::over(&state, &props, n / 3..n);
        assert!((a.kinetic_energy + b.kinetic_energy - whole.kinetic_energy).abs() < 1e-12);
        assert!((a.mass + b.mass - whole.mass).abs() < 1e-12);
        assert_eq!(FlowMoments::over(&state, &props, n..n), FlowMoments::default());
    }

    #[test]
    fn test_centroid_of_offset_blob() {
        let props = ParameterSet::with_peclet(1.0).unwrap().properties();
        let mut state = FlowState::new(AdaptiveMesh::uniform(Domain::centered(4.0), 3).unwrap());
        let k = state.mesh().locate(DVec2::new(1.2, -0.7)).unwrap();
        state.field_mut(FieldKind::Fraction)[k] = 1.0;
        let m = FlowMoments::local(&state, &props);
        let c = m.centroid().unwrap();
        assert_eq!(c, state.mesh().center(k));
    }

    #[test]
    fn test_degenerate_mass() {
        assert!(FlowMoments::default().centroid().is_none());
        let nan = FlowMoments {
            mass: f64::NAN,
            ..FlowMoments::default()
        };
        assert!(nan.centroid().is_none());
    }
}
