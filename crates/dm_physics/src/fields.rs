// crates/dm_physics/src/fields.rs

//! 场集合与流动状态
//!
//! 所有被跟踪的物理量都存放在 [`FieldSet`] 中，按 [`FieldKind`] 索引，
//! 与网格一起构成 [`FlowState`]。网格自适应时全部场一起重映射。

use dm_mesh::{
    plan_adaptation, AdaptLimits, AdaptStats, AdaptiveMesh, Boundary, Criterion, FieldLayer,
    Prolongation, ScalarField,
};
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, PhysicsResult};

/// 物理量种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// 符号距离（液滴内部为正）
    Distance,
    /// 体积分数（液滴内部为 1）
    Fraction,
    /// x 方向速度
    VelocityX,
    /// y 方向速度
    VelocityY,
    /// 压力
    Pressure,
    /// 表面活性剂浓度
    Concentration,
    /// 表面张力
    Tension,
    /// 界面曲率
    Curvature,
}

impl FieldKind {
    /// 全部种类（存储顺序）
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Distance,
        FieldKind::Fraction,
        FieldKind::VelocityX,
        FieldKind::VelocityY,
        FieldKind::Pressure,
        FieldKind::Concentration,
        FieldKind::Tension,
        FieldKind::Curvature,
    ];

    /// 存储下标
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// 名称（用于检查点与输出）
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Distance => "distance",
            FieldKind::Fraction => "fraction",
            FieldKind::VelocityX => "velocity_x",
            FieldKind::VelocityY => "velocity_y",
            FieldKind::Pressure => "pressure",
            FieldKind::Concentration => "concentration",
            FieldKind::Tension => "tension",
            FieldKind::Curvature => "curvature",
        }
    }

    /// 由名称解析
    pub fn from_name(name: &str) -> Option<FieldKind> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// 计算域边界条件
    pub fn boundary(self) -> Boundary {
        match self {
            FieldKind::VelocityX | FieldKind::VelocityY | FieldKind::Concentration => {
                Boundary::Dirichlet(0.0)
            }
            _ => Boundary::Neumann,
        }
    }

    /// 加密时的取值方式
    pub fn prolongation(self) -> Prolongation {
        match self {
            FieldKind::Distance
            | FieldKind::VelocityX
            | FieldKind::VelocityY
            | FieldKind::Concentration => Prolongation::Bilinear,
            FieldKind::Fraction
            | FieldKind::Pressure
            | FieldKind::Tension
            | FieldKind::Curvature => Prolongation::Injection,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 全部物理场
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: [ScalarField; 8],
}

impl FieldSet {
    /// 长度为 `n` 的全零场集合
    pub fn zeros(n: usize) -> Self {
        Self {
            fields: std::array::from_fn(|_| ScalarField::zeros(n)),
        }
    }

    /// 只读访问
    #[inline]
    pub fn get(&self, kind: FieldKind) -> &ScalarField {
        &self.fields[kind.index()]
    }

    /// 可变访问
    #[inline]
    pub fn get_mut(&mut self, kind: FieldKind) -> &mut ScalarField {
        &mut self.fields[kind.index()]
    }

    /// 替换某个场
    pub fn replace(&mut self, kind: FieldKind, field: ScalarField) -> ScalarField {
        std::mem::replace(&mut self.fields[kind.index()], field)
    }

    /// 按存储顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (FieldKind, &ScalarField)> {
        FieldKind::ALL.into_iter().zip(self.fields.iter())
    }

    /// 构造参与网格重映射的场层
    pub fn layers_mut(&mut self) -> Vec<FieldLayer<'_>> {
        FieldKind::ALL
            .into_iter()
            .zip(self.fields.iter_mut())
            .map(|(kind, field)| FieldLayer {
                name: kind.name(),
                field,
                prolongation: kind.prolongation(),
                boundary: kind.boundary(),
            })
            .collect()
    }
}

/// 网格自适应请求
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptRequest {
    /// 被监测的场及其绝对容差
    pub criteria: Vec<(FieldKind, f64)>,
    /// 级别上下限
    pub limits: AdaptLimits,
}

/// 网格 + 场
#[derive(Debug, Clone)]
pub struct FlowState {
    mesh: AdaptiveMesh,
    fields: FieldSet,
}

impl FlowState {
    /// 在网格上创建全零状态
    pub fn new(mesh: AdaptiveMesh) -> Self {
        let fields = FieldSet::zeros(mesh.len());
        Self { mesh, fields }
    }

    /// 由网格与场组装，检查长度一致
    pub fn from_parts(mesh: AdaptiveMesh, fields: FieldSet) -> PhysicsResult<Self> {
        for (kind, field) in fields.iter() {
            if field.len() != mesh.len() {
                return Err(PhysicsError::InvalidState(format!(
                    "场 {kind} 长度 {} 与叶单元数 {} 不一致",
                    field.len(),
                    mesh.len()
                )));
            }
        }
        Ok(Self { mesh, fields })
    }

    /// 网格
    #[inline]
    pub fn mesh(&self) -> &AdaptiveMesh {
        &self.mesh
    }

    /// 场集合
    #[inline]
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// 可变场集合
    #[inline]
    pub fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }

    /// 单个场
    #[inline]
    pub fn field(&self, kind: FieldKind) -> &ScalarField {
        self.fields.get(kind)
    }

    /// 单个可变场
    #[inline]
    pub fn field_mut(&mut self, kind: FieldKind) -> &mut ScalarField {
        self.fields.get_mut(kind)
    }

    /// 叶单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.mesh.len()
    }

    /// 按请求自适应网格，全部场随之重映射
    pub fn adapt(&mut self, request: &AdaptRequest) -> PhysicsResult<AdaptStats> {
        let criteria: Vec<Criterion<'_>> = request
            .criteria
            .iter()
            .map(|&(kind, tolerance)| Criterion {
                field: self.fields.get(kind),
                tolerance,
                boundary: kind.boundary(),
            })
            .collect();
        let plan = plan_adaptation(&self.mesh, &criteria, request.limits)?;

        let mut layers = self.fields.layers_mut();
        let stats = self.mesh.apply_plan(&plan, &mut layers)?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_mesh::Domain;

    #[test]
    fn test_field_names_roundtrip() {
        for kind in FieldKind::ALL {
            assert_eq!(FieldKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(FieldKind::from_name("vorticity"), None);
    }

    #[test]
    fn test_storage_order() {
        for (i, kind) in FieldKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_from_parts_checks_length() {
        let mesh = AdaptiveMesh::uniform(Domain::centered(1.0), 2).unwrap();
        assert!(FlowState::from_parts(mesh.clone(), FieldSet::zeros(16)).is_ok());
        assert!(FlowState::from_parts(mesh, FieldSet::zeros(4)).is_err());
    }

    #[test]
    fn test_adapt_remaps_every_field() {
        let mesh = AdaptiveMesh::uniform(Domain::centered(2.0), 4).unwrap();
        let mut state = FlowState::new(mesh);
        state.field_mut(FieldKind::Tension).fill(10.0);

        let request = AdaptRequest {
            criteria: vec![(FieldKind::Fraction, 1e-3)],
            limits: AdaptLimits::new(2, 4),
        };
        let stats = state.adapt(&request).unwrap();
        assert_eq!(stats.n_cells, 64);
        for (_, field) in state.fields().iter() {
            assert_eq!(field.len(), 64);
        }
        assert!(state.field(FieldKind::Tension).as_slice().iter().all(|&v| v == 10.0));
    }
}
