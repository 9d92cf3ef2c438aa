// crates/dm_mesh/src/tree.rs

//! 四叉树自适应网格
//!
//! 网格只保存叶单元。叶单元按 [`CellId`] 排序存放，场数据与叶单元一一对应，
//! 非叶单元的值通过 [`AdaptiveMesh::value_on`] 即时重建：
//!
//! - 被某个叶单元覆盖的更细单元取该叶单元的值（注入）
//! - 包含多个叶单元的更粗单元取子单元平均（限制）

use std::collections::HashMap;

use glam::DVec2;

use crate::cell::{CellId, Direction};
use crate::domain::Domain;
use crate::error::{MeshError, MeshResult};
use crate::field::{Boundary, ScalarField};

/// 四叉树自适应网格
#[derive(Debug, Clone)]
pub struct AdaptiveMesh {
    domain: Domain,
    leaves: Vec<CellId>,
    index: HashMap<CellId, usize>,
    depth: u8,
}

impl AdaptiveMesh {
    /// 指定级别的均匀网格
    pub fn uniform(domain: Domain, level: u8) -> MeshResult<Self> {
        check_level(level)?;
        let n = CellId::extent(level) as u32;
        let leaves = (0..n)
            .flat_map(|i| (0..n).map(move |j| CellId::new(level, i, j)))
            .collect();
        Ok(Self::from_sorted(domain, leaves))
    }

    /// 由叶单元集合构造，要求叶单元恰好划分计算域
    pub fn from_leaves(domain: Domain, mut leaves: Vec<CellId>) -> MeshResult<Self> {
        if leaves.is_empty() {
            return Err(MeshError::InvalidPartition("叶单元集合为空".into()));
        }
        leaves.sort_unstable();
        leaves.dedup();

        let depth = leaves.iter().map(|c| c.level).max().unwrap_or(0);
        check_level(depth)?;
        if let Some(bad) = leaves.iter().find(|c| !c.is_valid()) {
            return Err(MeshError::InvalidPartition(format!("单元 {bad} 超出计算域")));
        }

        let mesh = Self::from_sorted(domain, leaves);

        // 互不嵌套 + 面积之和等于计算域 => 划分
        for leaf in &mesh.leaves {
            let mut cur = leaf.parent();
            while let Some(p) = cur {
                if mesh.index.contains_key(&p) {
                    return Err(MeshError::InvalidPartition(format!(
                        "单元 {p} 与其后代 {leaf} 同时为叶单元"
                    )));
                }
                cur = p.parent();
            }
        }
        let area: u64 = mesh.leaves.iter().map(|c| c.area_units(depth)).sum();
        if area != CellId::ROOT.area_units(depth) {
            return Err(MeshError::InvalidPartition("叶单元未覆盖整个计算域".into()));
        }

        Ok(mesh)
    }

    fn from_sorted(domain: Domain, leaves: Vec<CellId>) -> Self {
        let index = leaves.iter().enumerate().map(|(k, &c)| (c, k)).collect();
        let depth = leaves.iter().map(|c| c.level).max().unwrap_or(0);
        Self {
            domain,
            leaves,
            index,
            depth,
        }
    }

    // =========================================================================
    // 基本查询
    // =========================================================================

    /// 计算域
    #[inline]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// 叶单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// 是否为空（合法网格总是非空）
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// 全部叶单元
    #[inline]
    pub fn leaves(&self) -> &[CellId] {
        &self.leaves
    }

    /// 第 `idx` 个叶单元
    #[inline]
    pub fn cell(&self, idx: usize) -> CellId {
        self.leaves[idx]
    }

    /// 叶单元索引
    #[inline]
    pub fn index_of(&self, id: &CellId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// 最深叶单元级别
    #[inline]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// 最浅叶单元级别
    pub fn min_depth(&self) -> u8 {
        self.leaves.iter().map(|c| c.level).min().unwrap_or(0)
    }

    /// 叶单元中心
    #[inline]
    pub fn center(&self, idx: usize) -> DVec2 {
        self.domain.cell_center(self.leaves[idx])
    }

    /// 叶单元尺寸
    #[inline]
    pub fn cell_size(&self, idx: usize) -> f64 {
        self.domain.cell_size(self.leaves[idx].level)
    }

    /// 叶单元面积
    #[inline]
    pub fn cell_area(&self, idx: usize) -> f64 {
        let h = self.cell_size(idx);
        h * h
    }

    /// 最小单元尺寸
    pub fn min_cell_size(&self) -> f64 {
        self.domain.cell_size(self.depth)
    }

    /// 包含点 `p` 的叶单元
    pub fn locate(&self, p: DVec2) -> Option<usize> {
        (0..=self.depth).find_map(|level| {
            self.domain
                .cell_at(p, level)
                .and_then(|id| self.index_of(&id))
        })
    }

    /// 覆盖单元 `id` 的叶单元（`id` 自身或其祖先）
    pub fn leaf_covering(&self, id: CellId) -> Option<usize> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if let Some(k) = self.index_of(&c) {
                return Some(k);
            }
            cur = c.parent();
        }
        None
    }

    // =========================================================================
    // 任意单元上的取值
    // =========================================================================

    /// 场在任意单元上的值
    ///
    /// 被叶单元覆盖时注入，否则取子单元平均。
    pub fn value_on(&self, field: &ScalarField, id: CellId) -> f64 {
        if let Some(k) = self.leaf_covering(id) {
            return field[k];
        }
        if id.level >= self.depth {
            // 合法划分下不可达
            return 0.0;
        }
        0.25 * id
            .children()
            .iter()
            .map(|&c| self.value_on(field, c))
            .sum::<f64>()
    }

    /// 单元 `id` 按 (di, dj) 偏移后的同级取值，越界时按边界条件构造虚单元
    pub fn sample(
        &self,
        field: &ScalarField,
        id: CellId,
        di: i64,
        dj: i64,
        boundary: Boundary,
    ) -> f64 {
        match id.offset(di, dj) {
            Some(target) => self.value_on(field, target),
            None => boundary.ghost(self.value_on(field, id.offset_clamped(di, dj))),
        }
    }

    /// 叶单元的面邻居值
    #[inline]
    pub fn neighbor_value(
        &self,
        field: &ScalarField,
        idx: usize,
        dir: Direction,
        boundary: Boundary,
    ) -> f64 {
        let (di, dj) = dir.offset();
        self.sample(field, self.leaves[idx], di, dj, boundary)
    }

    /// 检查场长度与叶单元数一致
    pub fn check_field(&self, name: &'static str, field: &ScalarField) -> MeshResult<()> {
        MeshError::check_len(name, self.len(), field.len())
    }

    /// 相邻叶单元级别差是否都不超过 1
    pub fn is_balanced(&self) -> bool {
        self.leaves.iter().all(|leaf| {
            Direction::ALL.iter().all(|&dir| {
                leaf.neighbor(dir)
                    .and_then(|n| self.leaf_covering(n))
                    .map_or(true, |k| self.leaves[k].level + 1 >= leaf.level)
            })
        })
    }
}

fn check_level(level: u8) -> MeshResult<()> {
    if level > crate::MAX_LEVEL {
        Err(MeshError::LevelTooDeep {
            level,
            max: crate::MAX_LEVEL,
        })
    } else {
        Ok(())
    }
}
