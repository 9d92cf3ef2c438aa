// crates/dm_physics/src/coupling.rs

//! 表面张力与浓度的耦合
//!
//! 每一步在引擎推进之前执行 `sigma = 1/Ca + k·c`。
//! 张力只由浓度决定，从不独立推进。

use dm_config::PhysicalProperties;
use rayon::prelude::*;

use crate::fields::{FieldKind, FlowState};

/// 张力耦合器（无状态）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyCoupler {
    base: f64,
    coupling: f64,
}

impl PropertyCoupler {
    /// 由物性参数创建
    pub fn new(props: &PhysicalProperties) -> Self {
        Self {
            base: props.tension_base,
            coupling: props.tension_coupling,
        }
    }

    /// 单点张力
    #[inline]
    pub fn tension(&self, concentration: f64) -> f64 {
        self.base + self.coupling * concentration
    }

    /// 按浓度重算全部单元的张力
    pub fn apply(&self, state: &mut FlowState) {
        let concentration = state.field(FieldKind::Concentration).as_slice().to_vec();
        state
            .field_mut(FieldKind::Tension)
            .as_mut_slice()
            .par_iter_mut()
            .zip(concentration.par_iter())
            .for_each(|(sigma, &c)| *sigma = self.tension(c));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_config::ParameterSet;
    use dm_mesh::{AdaptiveMesh, Domain};

    fn coupler() -> PropertyCoupler {
        PropertyCoupler::new(&ParameterSet::with_peclet(1.0).unwrap().properties())
    }

    #[test]
    fn test_tension_formula() {
        let c = coupler();
        assert!((c.tension(0.0) - 10.0).abs() < 1e-12);
        assert!((c.tension(0.25) - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_apply_is_pointwise() {
        let mesh = AdaptiveMesh::uniform(Domain::centered(2.0), 3).unwrap();
        let mut state = FlowState::new(mesh);
        let n = state.n_cells();
        for k in 0..n {
            state.field_mut(FieldKind::Concentration)[k] = k as f64 * 0.01;
        }
        coupler().apply(&mut state);
        let first = state.field(FieldKind::Tension).clone();

        // 逆序写入相同浓度，结果与顺序无关
        let mut reversed = FlowState::new(state.mesh().clone());
        for k in (0..n).rev() {
            reversed.field_mut(FieldKind::Concentration)[k] = k as f64 * 0.01;
        }
        coupler().apply(&mut reversed);
        assert_eq!(&first, reversed.field(FieldKind::Tension));

        for k in 0..n {
            assert!((first[k] - (10.0 + 4.0 * k as f64 * 0.01)).abs() < 1e-12);
        }
    }
}
