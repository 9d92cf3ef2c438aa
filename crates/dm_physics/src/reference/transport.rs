// crates/dm_physics/src/reference/transport.rs

//! 输运算子：半拉格朗日平流与隐式 Jacobi 扩散

use dm_mesh::{interpolate, AdaptiveMesh, Boundary, ScalarField};
use glam::DVec2;
use rayon::prelude::*;

/// 各单元中心沿当前速度回溯 `dt` 得到的出发点（截断到计算域内）
pub fn departure_points(
    mesh: &AdaptiveMesh,
    u: &ScalarField,
    v: &ScalarField,
    dt: f64,
) -> Vec<DVec2> {
    let domain = *mesh.domain();
    let lo = domain.origin;
    let hi = domain.origin + DVec2::splat(domain.size);
    (0..mesh.len())
        .into_par_iter()
        .map(|k| {
            let p = mesh.center(k) - dt * DVec2::new(u[k], v[k]);
            if p.is_finite() {
                p.clamp(lo, hi)
            } else {
                mesh.center(k)
            }
        })
        .collect()
}

/// 半拉格朗日平流：新值为出发点处的插值
pub fn advect(
    mesh: &AdaptiveMesh,
    field: &ScalarField,
    departures: &[DVec2],
    bc: Boundary,
) -> ScalarField {
    let values = departures
        .par_iter()
        .enumerate()
        .map(|(k, &p)| interpolate(mesh, field, p, bc).unwrap_or(field[k]))
        .collect();
    ScalarField::from_vec(values)
}

/// 隐式扩散 `x - a ∇²x = b` 的 Jacobi 迭代求解
///
/// `coefficient[k]` 为单元 k 的 `a = dt · D_k`。
#[derive(Debug, Clone, Copy)]
pub struct ImplicitDiffusion<'a> {
    /// 逐单元扩散系数（已乘 dt）
    pub coefficient: &'a [f64],
    /// 边界条件
    pub boundary: Boundary,
    /// 迭代次数
    pub iterations: usize,
}

impl ImplicitDiffusion<'_> {
    /// 以 `rhs` 为初值迭代求解
    pub fn solve(&self, mesh: &AdaptiveMesh, rhs: &ScalarField) -> ScalarField {
        let mut x = rhs.clone();
        for _ in 0..self.iterations {
            let next = (0..mesh.len())
                .into_par_iter()
                .map(|k| {
                    let a = self.coefficient[k];
                    if a <= 0.0 {
                        return rhs[k];
                    }
                    let id = mesh.cell(k);
                    let h = mesh.cell_size(k);
                    let w = a / (h * h);
                    let sum = mesh.sample(&x, id, 1, 0, self.boundary)
                        + mesh.sample(&x, id, -1, 0, self.boundary)
                        + mesh.sample(&x, id, 0, 1, self.boundary)
                        + mesh.sample(&x, id, 0, -1, self.boundary);
                    (rhs[k] + w * sum) / (1.0 + 4.0 * w)
                })
                .collect();
            x = ScalarField::from_vec(next);
        }
        x
    }
}
