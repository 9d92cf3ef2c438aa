// crates/dm_mesh/src/adapt.rs

//! 基于小波误差估计的自适应加密/粗化
//!
//! 每个叶单元的误差定义为其值与由父级（及父级邻居）双线性预测值之差：
//!
//! ```text
//! err = | v - (9 P + 3 P_x + 3 P_y + P_xy) / 16 |
//! ```
//!
//! 流程分两步，先用只读场生成 [`AdaptPlan`]，再由 [`AdaptiveMesh::apply_plan`]
//! 修改网格并把所有场重映射到新叶单元上：
//!
//! - 任一判据 `err > tol` 且级别低于上限 => 加密
//! - 一族四个子单元都满足 `err < tol / 1.5` 且高于下限 => 粗化
//! - 低于下限的叶单元强制加密，高于上限的强制粗化
//! - 最后做 2:1 平衡，相邻叶单元级别差不超过 1

use std::collections::{BTreeSet, HashSet};

use rayon::prelude::*;

use crate::cell::{CellId, Direction};
use crate::error::{MeshError, MeshResult};
use crate::field::{Boundary, Prolongation, ScalarField};
use crate::interpolate::interpolate;
use crate::tree::AdaptiveMesh;

/// 粗化时误差需低于 `tol / COARSEN_FACTOR`
pub const COARSEN_FACTOR: f64 = 1.5;

/// 单个场的加密判据
#[derive(Debug, Clone, Copy)]
pub struct Criterion<'a> {
    /// 被监测的场
    pub field: &'a ScalarField,
    /// 绝对误差容差
    pub tolerance: f64,
    /// 边界条件
    pub boundary: Boundary,
}

/// 级别上下限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptLimits {
    /// 最小级别
    pub min_level: u8,
    /// 最大级别
    pub max_level: u8,
}

impl AdaptLimits {
    /// 创建级别上下限（自动保证 min <= max）
    pub fn new(min_level: u8, max_level: u8) -> Self {
        Self {
            min_level: min_level.min(max_level),
            max_level,
        }
    }
}

/// 自适应计划
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdaptPlan {
    /// 待加密的叶单元
    pub refine: Vec<CellId>,
    /// 待粗化的父单元（其四个子单元均为叶）
    pub coarsen: Vec<CellId>,
    /// 级别上下限
    pub limits: Option<AdaptLimits>,
}

impl AdaptPlan {
    /// 计划是否为空
    pub fn is_empty(&self) -> bool {
        self.refine.is_empty() && self.coarsen.is_empty()
    }
}

/// 参与重映射的场
#[derive(Debug)]
pub struct FieldLayer<'a> {
    /// 名称（用于错误信息）
    pub name: &'static str,
    /// 场数据
    pub field: &'a mut ScalarField,
    /// 加密时的取值方式
    pub prolongation: Prolongation,
    /// 边界条件
    pub boundary: Boundary,
}

/// 自适应统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptStats {
    /// 被加密的叶单元数
    pub refined: usize,
    /// 被粗化的单元族数
    pub coarsened: usize,
    /// 自适应后的叶单元数
    pub n_cells: usize,
}

/// 单元的小波误差（级别 0 无父级，误差为 0）
pub fn wavelet_error(mesh: &AdaptiveMesh, field: &ScalarField, idx: usize, bc: Boundary) -> f64 {
    let id = mesh.cell(idx);
    let Some(parent) = id.parent() else {
        return 0.0;
    };
    let sx: i64 = if id.i % 2 == 0 { -1 } else { 1 };
    let sy: i64 = if id.j % 2 == 0 { -1 } else { 1 };

    let p = mesh.value_on(field, parent);
    let px = mesh.sample(field, parent, sx, 0, bc);
    let py = mesh.sample(field, parent, 0, sy, bc);
    let pxy = mesh.sample(field, parent, sx, sy, bc);
    let predicted = (9.0 * p + 3.0 * px + 3.0 * py + pxy) / 16.0;
    (field[idx] - predicted).abs()
}

/// 根据判据生成自适应计划
pub fn plan_adaptation(
    mesh: &AdaptiveMesh,
    criteria: &[Criterion<'_>],
    limits: AdaptLimits,
) -> MeshResult<AdaptPlan> {
    for c in criteria {
        mesh.check_field("criterion", c.field)?;
    }

    // 归一化误差：max(err / tol)
    let scaled: Vec<f64> = (0..mesh.len())
        .into_par_iter()
        .map(|k| {
            criteria
                .iter()
                .map(|c| wavelet_error(mesh, c.field, k, c.boundary) / c.tolerance)
                .fold(0.0_f64, |m, e| if e.is_nan() { f64::INFINITY } else { m.max(e) })
        })
        .collect();

    let refine: Vec<CellId> = mesh
        .leaves()
        .iter()
        .zip(&scaled)
        .filter(|&(c, &e)| c.level < limits.min_level || (e > 1.0 && c.level < limits.max_level))
        .map(|(c, _)| *c)
        .collect();
    let refine_set: HashSet<CellId> = refine.iter().copied().collect();

    let mut candidates: BTreeSet<CellId> = BTreeSet::new();
    for c in mesh.leaves() {
        if let Some(p) = c.parent() {
            candidates.insert(p);
        }
    }

    let coarsen = candidates
        .into_iter()
        .filter(|parent| {
            let child_level = parent.level + 1;
            let kids = parent.children();
            let indices: Option<Vec<usize>> = kids.iter().map(|c| mesh.index_of(c)).collect();
            let Some(indices) = indices else {
                return false;
            };
            if kids.iter().any(|c| refine_set.contains(c)) {
                return false;
            }
            if child_level > limits.max_level {
                return true;
            }
            child_level > limits.min_level
                && indices.iter().all(|&k| scaled[k] < 1.0 / COARSEN_FACTOR)
        })
        .collect();

    Ok(AdaptPlan {
        refine,
        coarsen,
        limits: Some(limits),
    })
}

impl AdaptiveMesh {
    /// 执行自适应计划并重映射所有场
    ///
    /// 新叶单元的取值：
    /// - 未变化的叶单元原样保留
    /// - 加密产生的单元按各场的 [`Prolongation`] 取值
    /// - 粗化产生的单元取原子单元平均
    pub fn apply_plan(
        &mut self,
        plan: &AdaptPlan,
        layers: &mut [FieldLayer<'_>],
    ) -> MeshResult<AdaptStats> {
        for layer in layers.iter() {
            self.check_field(layer.name, layer.field)?;
        }
        let limits = plan
            .limits
            .unwrap_or_else(|| AdaptLimits::new(0, crate::MAX_LEVEL));
        if limits.max_level > crate::MAX_LEVEL {
            return Err(MeshError::LevelTooDeep {
                level: limits.max_level,
                max: crate::MAX_LEVEL,
            });
        }

        let mut set: BTreeSet<CellId> = self.leaves().iter().copied().collect();
        let mut stats = AdaptStats::default();

        for cell in &plan.refine {
            if cell.level < limits.max_level && set.remove(cell) {
                set.extend(cell.children());
                stats.refined += 1;
            }
        }

        for parent in &plan.coarsen {
            let kids = parent.children();
            if kids.iter().all(|c| set.contains(c)) {
                for c in &kids {
                    set.remove(c);
                }
                set.insert(*parent);
                stats.coarsened += 1;
            }
        }

        stats.refined += balance(&mut set, limits);

        let new_leaves: Vec<CellId> = set.into_iter().collect();
        if new_leaves.as_slice() == self.leaves() {
            stats.n_cells = self.len();
            return Ok(stats);
        }
        let new_mesh = AdaptiveMesh::from_leaves(*self.domain(), new_leaves)?;

        for layer in layers.iter_mut() {
            let remapped = remap(self, &new_mesh, layer.field, layer.prolongation, layer.boundary);
            *layer.field = remapped;
        }

        log::debug!(
            "网格自适应: 加密 {}, 粗化 {}, 叶单元 {} -> {}",
            stats.refined,
            stats.coarsened,
            self.len(),
            new_mesh.len()
        );

        *self = new_mesh;
        stats.n_cells = self.len();
        Ok(stats)
    }
}

/// 强制最小级别并消除相邻级别差大于 1 的情况，返回额外加密次数
fn balance(set: &mut BTreeSet<CellId>, limits: AdaptLimits) -> usize {
    let mut splits = 0;
    loop {
        let mut to_split: BTreeSet<CellId> = BTreeSet::new();
        for leaf in set.iter() {
            if leaf.level < limits.min_level {
                to_split.insert(*leaf);
                continue;
            }
            for dir in Direction::ALL {
                let Some(n) = leaf.neighbor(dir) else {
                    continue;
                };
                if let Some(cover) = covering(set, n) {
                    if cover.level + 1 < leaf.level {
                        to_split.insert(cover);
                    }
                }
            }
        }
        if to_split.is_empty() {
            return splits;
        }
        for cell in to_split {
            if set.remove(&cell) {
                set.extend(cell.children());
                splits += 1;
            }
        }
    }
}

fn covering(set: &BTreeSet<CellId>, id: CellId) -> Option<CellId> {
    let mut cur = Some(id);
    while let Some(c) = cur {
        if set.contains(&c) {
            return Some(c);
        }
        cur = c.parent();
    }
    None
}

fn remap(
    old: &AdaptiveMesh,
    new: &AdaptiveMesh,
    field: &ScalarField,
    prolongation: Prolongation,
    bc: Boundary,
) -> ScalarField {
    let values = (0..new.len())
        .into_par_iter()
        .map(|k| {
            let id = new.cell(k);
            if let Some(old_k) = old.index_of(&id) {
                return field[old_k];
            }
            match old.leaf_covering(id) {
                Some(old_k) => match prolongation {
                    Prolongation::Injection => field[old_k],
                    Prolongation::Bilinear => {
                        interpolate(old, field, new.center(k), bc).unwrap_or(field[old_k])
                    }
                },
                None => old.value_on(field, id),
            }
        })
        .collect();
    ScalarField::from_vec(values)
}
