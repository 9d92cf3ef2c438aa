// crates/dm_foundation/src/numerics.rs

//! 数值工具
//!
//! 全局归约需要与累加顺序无关的结果，这里提供 Kahan 补偿求和。

/// Kahan 求和器
///
/// 使用 Kahan 算法减少浮点累加误差。
///
/// # 示例
///
/// ```
/// use dm_foundation::numerics::KahanSum;
///
/// let total = KahanSum::sum_iter(vec![0.1_f64; 1000]);
/// assert!((total - 100.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    /// 创建新的求和器
    pub fn new() -> Self {
        Self {
            sum: 0.0,
            compensation: 0.0,
        }
    }

    /// 添加一个值
    #[inline]
    pub fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    /// 获取当前求和值
    #[inline]
    pub fn value(&self) -> f64 {
        self.sum
    }

    /// 从迭代器求和
    pub fn sum_iter<I: IntoIterator<Item = f64>>(iter: I) -> f64 {
        let mut kahan = Self::new();
        for v in iter {
            kahan.add(v);
        }
        kahan.value()
    }
}
