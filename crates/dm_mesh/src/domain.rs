// crates/dm_mesh/src/domain.rs

//! 正方形计算域

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::cell::CellId;

/// 正方形计算域，`origin` 为左下角
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// 左下角坐标
    pub origin: DVec2,
    /// 边长
    pub size: f64,
}

impl Domain {
    /// 以原点为中心、边长为 `size` 的计算域
    pub fn centered(size: f64) -> Self {
        Self {
            origin: DVec2::splat(-0.5 * size),
            size,
        }
    }

    /// 指定级别的单元尺寸
    #[inline]
    pub fn cell_size(&self, level: u8) -> f64 {
        self.size / CellId::extent(level) as f64
    }

    /// 单元中心坐标
    #[inline]
    pub fn cell_center(&self, id: CellId) -> DVec2 {
        let h = self.cell_size(id.level);
        self.origin + DVec2::new((f64::from(id.i) + 0.5) * h, (f64::from(id.j) + 0.5) * h)
    }

    /// 点是否位于计算域内（含边界）
    pub fn contains(&self, p: DVec2) -> bool {
        let q = p - self.origin;
        q.x >= 0.0 && q.y >= 0.0 && q.x <= self.size && q.y <= self.size
    }

    /// 指定级别下包含点 `p` 的单元，位于上/右边界的点归入最后一个单元
    pub fn cell_at(&self, p: DVec2, level: u8) -> Option<CellId> {
        if !self.contains(p) {
            return None;
        }
        let n = CellId::extent(level);
        let h = self.cell_size(level);
        let q = p - self.origin;
        let i = ((q.x / h).floor() as u64).min(n - 1);
        let j = ((q.y / h).floor() as u64).min(n - 1);
        Some(CellId::new(level, i as u32, j as u32))
    }
}
