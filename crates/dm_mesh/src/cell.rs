// crates/dm_mesh/src/cell.rs

//! 四叉树单元标识
//!
//! 级别 `level` 的单元把计算域均分为 `2^level × 2^level` 块，
//! `(i, j)` 分别是 x、y 方向的整数索引。

use serde::{Deserialize, Serialize};

/// 面邻居方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// +x
    East,
    /// -x
    West,
    /// +y
    North,
    /// -y
    South,
}

impl Direction {
    /// 全部方向
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
    ];

    /// 整数偏移 (di, dj)
    #[inline]
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::North => (0, 1),
            Direction::South => (0, -1),
        }
    }
}

/// 单元标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    /// 细化级别
    pub level: u8,
    /// x 方向索引
    pub i: u32,
    /// y 方向索引
    pub j: u32,
}

impl CellId {
    /// 根单元（整个计算域）
    pub const ROOT: CellId = CellId { level: 0, i: 0, j: 0 };

    /// 创建单元标识
    #[inline]
    pub const fn new(level: u8, i: u32, j: u32) -> Self {
        Self { level, i, j }
    }

    /// 该级别每个方向的单元数
    #[inline]
    pub fn extent(level: u8) -> u64 {
        1u64 << level
    }

    /// 索引是否位于计算域内
    #[inline]
    pub fn is_valid(&self) -> bool {
        let n = Self::extent(self.level);
        u64::from(self.i) < n && u64::from(self.j) < n
    }

    /// 父单元
    pub fn parent(&self) -> Option<CellId> {
        (self.level > 0).then(|| CellId::new(self.level - 1, self.i / 2, self.j / 2))
    }

    /// 指定级别的祖先（`level` 不大于自身级别）
    pub fn ancestor(&self, level: u8) -> Option<CellId> {
        if level > self.level {
            return None;
        }
        let shift = self.level - level;
        Some(CellId::new(level, self.i >> shift, self.j >> shift))
    }

    /// 是否为 `other` 的严格祖先
    pub fn is_ancestor_of(&self, other: &CellId) -> bool {
        self.level < other.level && other.ancestor(self.level) == Some(*self)
    }

    /// 四个子单元，顺序为 (0,0) (1,0) (0,1) (1,1)
    pub fn children(&self) -> [CellId; 4] {
        let (l, i, j) = (self.level + 1, self.i * 2, self.j * 2);
        [
            CellId::new(l, i, j),
            CellId::new(l, i + 1, j),
            CellId::new(l, i, j + 1),
            CellId::new(l, i + 1, j + 1),
        ]
    }

    /// 同级偏移单元，超出计算域时返回 `None`
    pub fn offset(&self, di: i64, dj: i64) -> Option<CellId> {
        let n = Self::extent(self.level) as i64;
        let i = i64::from(self.i) + di;
        let j = i64::from(self.j) + dj;
        if (0..n).contains(&i) && (0..n).contains(&j) {
            Some(CellId::new(self.level, i as u32, j as u32))
        } else {
            None
        }
    }

    /// 同级偏移单元，索引截断到计算域内
    pub fn offset_clamped(&self, di: i64, dj: i64) -> CellId {
        let max = Self::extent(self.level) as i64 - 1;
        let i = (i64::from(self.i) + di).clamp(0, max);
        let j = (i64::from(self.j) + dj).clamp(0, max);
        CellId::new(self.level, i as u32, j as u32)
    }

    /// 面邻居
    pub fn neighbor(&self, dir: Direction) -> Option<CellId> {
        let (di, dj) = dir.offset();
        self.offset(di, dj)
    }

    /// 以 `max_level` 为最细级别时单元所占的最细单元数
    pub fn area_units(&self, max_level: u8) -> u64 {
        1u64 << (2 * u32::from(max_level - self.level))
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}({}, {})", self.level, self.i, self.j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_children() {
        let c = CellId::new(3, 5, 2);
        let p = c.parent().unwrap();
        assert_eq!(p, CellId::new(2, 2, 1));
        assert!(p.children().contains(&c));
        assert!(CellId::ROOT.parent().is_none());
    }

    #[test]
    fn test_ancestor() {
        let c = CellId::new(4, 13, 6);
        assert_eq!(c.ancestor(4), Some(c));
        assert_eq!(c.ancestor(1), Some(CellId::new(1, 1, 0)));
        assert_eq!(c.ancestor(5), None);
        assert!(CellId::ROOT.is_ancestor_of(&c));
        assert!(!c.is_ancestor_of(&c));
    }

    #[test]
    fn test_neighbor_bounds() {
        let c = CellId::new(1, 0, 1);
        assert_eq!(c.neighbor(Direction::East), Some(CellId::new(1, 1, 1)));
        assert_eq!(c.neighbor(Direction::West), None);
        assert_eq!(c.neighbor(Direction::North), None);
        assert_eq!(c.offset_clamped(-3, 2), CellId::new(1, 0, 1));
    }

    #[test]
    fn test_area_units() {
        assert_eq!(CellId::ROOT.area_units(3), 64);
        assert_eq!(CellId::new(3, 0, 0).area_units(3), 1);
    }
}
