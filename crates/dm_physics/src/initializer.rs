// crates/dm_physics/src/initializer.rs

//! 初始场
//!
//! 单位圆液滴位于原点，速度与压力为零，浓度为均匀基线值，
//! 张力按耦合公式给出。初始化器按值消费，只能执行一次。

use dm_config::{ParameterSet, PhysicalProperties};
use rayon::prelude::*;

use crate::coupling::PropertyCoupler;
use crate::fields::{FieldKind, FlowState};

/// 由符号距离得到体积分数：界面两侧各一个单元宽度内线性过渡
#[inline]
pub fn fraction_from_distance(distance: f64, h: f64) -> f64 {
    (0.5 + distance / h).clamp(0.0, 1.0)
}

/// 初始场生成器
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInitializer {
    radius: f64,
    baseline: f64,
    props: PhysicalProperties,
}

impl FieldInitializer {
    /// 由参数集创建
    pub fn new(params: &ParameterSet) -> Self {
        let physics = &params.config().physics;
        Self {
            radius: physics.droplet_radius,
            baseline: physics.baseline_concentration,
            props: params.properties(),
        }
    }

    /// 写入全部场的初始值
    pub fn apply(self, state: &mut FlowState) {
        let n = state.n_cells();
        let distance: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|k| self.radius - state.mesh().center(k).length())
            .collect();
        let fraction: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|k| fraction_from_distance(distance[k], state.mesh().cell_size(k)))
            .collect();

        let fields = state.fields_mut();
        fields.get_mut(FieldKind::Distance).as_mut_slice().copy_from_slice(&distance);
        fields.get_mut(FieldKind::Fraction).as_mut_slice().copy_from_slice(&fraction);
        fields.get_mut(FieldKind::VelocityX).fill(0.0);
        fields.get_mut(FieldKind::VelocityY).fill(0.0);
        fields.get_mut(FieldKind::Pressure).fill(0.0);
        fields.get_mut(FieldKind::Concentration).fill(self.baseline);
        fields.get_mut(FieldKind::Curvature).fill(0.0);

        PropertyCoupler::new(&self.props).apply(state);

        log::debug!(
            "初始场: 半径 {}, 基线浓度 {}, 单元数 {}",
            self.radius,
            self.baseline,
            n
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_mesh::{AdaptiveMesh, Domain};

    fn initial_state() -> FlowState {
        let params = ParameterSet::with_peclet(1.0).unwrap();
        let mesh = AdaptiveMesh::uniform(Domain::centered(4.0), 5).unwrap();
        let mut state = FlowState::new(mesh);
        FieldInitializer::new(&params).apply(&mut state);
        state
    }

    #[test]
    fn test_distance_sign() {
        let state = initial_state();
        let d = state.field(FieldKind::Distance);
        let inside = state.mesh().locate(glam::DVec2::new(0.1, 0.1)).unwrap();
        let outside = state.mesh().locate(glam::DVec2::new(1.8, 1.8)).unwrap();
        assert!(d[inside] > 0.0);
        assert!(d[outside] < 0.0);
        assert_eq!(state.field(FieldKind::Fraction)[inside], 1.0);
        assert_eq!(state.field(FieldKind::Fraction)[outside], 0.0);
    }

    #[test]
    fn test_rest_state() {
        let state = initial_state();
        assert_eq!(state.field(FieldKind::VelocityX).max_abs(), 0.0);
        assert_eq!(state.field(FieldKind::VelocityY).max_abs(), 0.0);
        assert_eq!(state.field(FieldKind::Concentration).max_abs(), 0.0);
        assert!(state
            .field(FieldKind::Tension)
            .as_slice()
            .iter()
            .all(|&s| (s - 10.0).abs() < 1e-12));
    }

    #[test]
    fn test_fraction_from_distance() {
        assert_eq!(fraction_from_distance(0.0, 0.1), 0.5);
        assert_eq!(fraction_from_distance(1.0, 0.1), 1.0);
        assert_eq!(fraction_from_distance(-1.0, 0.1), 0.0);
    }
}
