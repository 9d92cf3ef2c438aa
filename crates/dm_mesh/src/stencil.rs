// crates/dm_mesh/src/stencil.rs

//! 叶单元上的差分算子
//!
//! 所有算子都使用叶单元自身尺寸的同级模板，邻居值由
//! [`AdaptiveMesh::sample`] 重建，因此可跨越粗细界面。

use glam::DVec2;
use rayon::prelude::*;

use crate::field::{Boundary, ScalarField};
use crate::tree::AdaptiveMesh;

/// 梯度模长低于该值时曲率记为 0
const GRADIENT_EPS: f64 = 1e-12;

/// 中心差分梯度
pub fn gradient(mesh: &AdaptiveMesh, field: &ScalarField, idx: usize, bc: Boundary) -> DVec2 {
    let id = mesh.cell(idx);
    let h = mesh.cell_size(idx);
    let e = mesh.sample(field, id, 1, 0, bc);
    let w = mesh.sample(field, id, -1, 0, bc);
    let n = mesh.sample(field, id, 0, 1, bc);
    let s = mesh.sample(field, id, 0, -1, bc);
    DVec2::new(e - w, n - s) / (2.0 * h)
}

/// 五点拉普拉斯
pub fn laplacian(mesh: &AdaptiveMesh, field: &ScalarField, idx: usize, bc: Boundary) -> f64 {
    let id = mesh.cell(idx);
    let h = mesh.cell_size(idx);
    let c = field[idx];
    let sum = mesh.sample(field, id, 1, 0, bc)
        + mesh.sample(field, id, -1, 0, bc)
        + mesh.sample(field, id, 0, 1, bc)
        + mesh.sample(field, id, 0, -1, bc);
    (sum - 4.0 * c) / (h * h)
}

/// 所有叶单元上的梯度
pub fn gradient_field(mesh: &AdaptiveMesh, field: &ScalarField, bc: Boundary) -> Vec<DVec2> {
    (0..mesh.len())
        .into_par_iter()
        .map(|k| gradient(mesh, field, k, bc))
        .collect()
}

/// 由符号距离场（内部为正）计算界面曲率
///
/// `kappa = -(d_xx d_y² - 2 d_x d_y d_xy + d_yy d_x²) / |∇d|³`，
/// 半径为 R 的圆得到 `1/R`。结果截断到 `[-1/h, 1/h]`。
pub fn curvature_from_distance(mesh: &AdaptiveMesh, distance: &ScalarField) -> ScalarField {
    let bc = Boundary::Neumann;
    let values = (0..mesh.len())
        .into_par_iter()
        .map(|k| {
            let id = mesh.cell(k);
            let h = mesh.cell_size(k);
            let c = distance[k];
            let at = |di, dj| mesh.sample(distance, id, di, dj, bc);

            let (e, w, n, s) = (at(1, 0), at(-1, 0), at(0, 1), at(0, -1));
            let dx = (e - w) / (2.0 * h);
            let dy = (n - s) / (2.0 * h);
            let g2 = dx * dx + dy * dy;
            if g2 < GRADIENT_EPS {
                return 0.0;
            }

            let dxx = (e - 2.0 * c + w) / (h * h);
            let dyy = (n - 2.0 * c + s) / (h * h);
            let dxy = (at(1, 1) - at(-1, 1) - at(1, -1) + at(-1, -1)) / (4.0 * h * h);

            let kappa = -(dxx * dy * dy - 2.0 * dx * dy * dxy + dyy * dx * dx) / g2.powf(1.5);
            let limit = 1.0 / h;
            if kappa.is_finite() {
                kappa.clamp(-limit, limit)
            } else {
                0.0
            }
        })
        .collect();
    ScalarField::from_vec(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    fn sampled(mesh: &AdaptiveMesh, f: impl Fn(DVec2) -> f64) -> ScalarField {
        ScalarField::from_vec((0..mesh.len()).map(|k| f(mesh.center(k))).collect())
    }

    #[test]
    fn test_gradient_linear() {
        let mesh = AdaptiveMesh::uniform(Domain::centered(2.0), 4).unwrap();
        let field = sampled(&mesh, |p| 3.0 * p.x - 2.0 * p.y);
        let interior = mesh.locate(DVec2::new(0.1, 0.1)).unwrap();
        let g = gradient(&mesh, &field, interior, Boundary::Neumann);
        assert!((g.x - 3.0).abs() < 1e-10);
        assert!((g.y + 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_laplacian_quadratic() {
        let mesh = AdaptiveMesh::uniform(Domain::centered(2.0), 4).unwrap();
        let field = sampled(&mesh, |p| p.x * p.x + p.y * p.y);
        let interior = mesh.locate(DVec2::new(0.3, -0.2)).unwrap();
        let lap = laplacian(&mesh, &field, interior, Boundary::Neumann);
        assert!((lap - 4.0).abs() < 1e-8);
    }

    #[test]
    fn test_circle_curvature() {
        let mesh = AdaptiveMesh::uniform(Domain::centered(4.0), 7).unwrap();
        let radius = 1.0;
        let distance = sampled(&mesh, |p| radius - p.length());
        let kappa = curvature_from_distance(&mesh, &distance);

        let h = mesh.min_cell_size();
        let mut checked = 0;
        for k in 0..mesh.len() {
            if distance[k].abs() < h {
                let expected = 1.0 / mesh.center(k).length();
                assert!((kappa[k] - expected).abs() < 0.05, "kappa = {}", kappa[k]);
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_flat_distance_zero_curvature() {
        let mesh = AdaptiveMesh::uniform(Domain::centered(2.0), 3).unwrap();
        let distance = ScalarField::filled(mesh.len(), 0.5);
        let kappa = curvature_from_distance(&mesh, &distance);
        assert!(kappa.as_slice().iter().all(|&k| k == 0.0));
    }
}
