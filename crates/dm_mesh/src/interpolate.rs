// crates/dm_mesh/src/interpolate.rs

//! 双线性插值
//!
//! 以包含查询点的叶单元及其朝向查询点一侧的三个同级邻居构成插值模板。
//! 查询点恰好位于单元中心时返回该单元的值。

use glam::DVec2;

use crate::field::{Boundary, ScalarField};
use crate::tree::AdaptiveMesh;

/// 在点 `p` 处插值，点位于计算域外时返回 `None`
pub fn interpolate(
    mesh: &AdaptiveMesh,
    field: &ScalarField,
    p: DVec2,
    bc: Boundary,
) -> Option<f64> {
    let k = mesh.locate(p)?;
    let id = mesh.cell(k);
    let h = mesh.cell_size(k);
    let offset = p - mesh.center(k);

    let sx: i64 = if offset.x < 0.0 { -1 } else { 1 };
    let sy: i64 = if offset.y < 0.0 { -1 } else { 1 };
    let tx = (offset.x.abs() / h).min(0.5);
    let ty = (offset.y.abs() / h).min(0.5);

    let v00 = field[k];
    let v10 = mesh.sample(field, id, sx, 0, bc);
    let v01 = mesh.sample(field, id, 0, sy, bc);
    let v11 = mesh.sample(field, id, sx, sy, bc);

    Some(
        (1.0 - tx) * (1.0 - ty) * v00
            + tx * (1.0 - ty) * v10
            + (1.0 - tx) * ty * v01
            + tx * ty * v11,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    #[test]
    fn test_exact_at_centers() {
        let mesh = AdaptiveMesh::uniform(Domain::centered(2.0), 3).unwrap();
        let field = ScalarField::from_vec((0..mesh.len()).map(|k| (k as f64).sin()).collect());
        for k in 0..mesh.len() {
            let v = interpolate(&mesh, &field, mesh.center(k), Boundary::Neumann).unwrap();
            assert_eq!(v, field[k]);
        }
    }

    #[test]
    fn test_linear_reproduced_inside() {
        let mesh = AdaptiveMesh::uniform(Domain::centered(2.0), 4).unwrap();
        let f = |p: DVec2| 1.0 + 2.0 * p.x + 0.5 * p.y;
        let field = ScalarField::from_vec((0..mesh.len()).map(|k| f(mesh.center(k))).collect());
        let p = DVec2::new(0.33, -0.41);
        let v = interpolate(&mesh, &field, p, Boundary::Neumann).unwrap();
        assert!((v - f(p)).abs() < 1e-12);
    }

    #[test]
    fn test_outside_domain() {
        let mesh = AdaptiveMesh::uniform(Domain::centered(2.0), 2).unwrap();
        let field = ScalarField::zeros(mesh.len());
        assert!(interpolate(&mesh, &field, DVec2::new(1.5, 0.0), Boundary::Neumann).is_none());
    }
}
