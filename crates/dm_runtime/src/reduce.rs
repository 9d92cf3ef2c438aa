// crates/dm_runtime/src/reduce.rs

//! 分区并行归约
//!
//! 单元按固定大小切成分区，分区内由 rayon 并行计算部分和，
//! 再按分区顺序做 Kahan 合并。分区边界只取决于单元数和分区大小，
//! 与线程数无关，所以同一输入总是得到逐位相同的结果。

use std::ops::Range;

use dm_foundation::KahanSum;
use rayon::prelude::*;

/// 默认分区大小（单元数）
pub const DEFAULT_PARTITION_SIZE: usize = 4096;

/// 把 `0..n` 切成长度不超过 `chunk` 的连续分区
pub fn partitions(n: usize, chunk: usize) -> impl Iterator<Item = Range<usize>> {
    let chunk = chunk.max(1);
    (0..n.div_ceil(chunk)).map(move |p| {
        let start = p * chunk;
        start..(start + chunk).min(n)
    })
}

/// 第 `rank` 个工作者（共 `size` 个）负责的连续单元区间
///
/// 各区间互不相交且按 rank 顺序覆盖 `0..n`，前 `n % size` 个区间多一个单元。
pub fn owned_range(n: usize, rank: usize, size: usize) -> Range<usize> {
    let size = size.max(1);
    let base = n / size;
    let extra = n % size;
    let start = rank * base + rank.min(extra);
    let len = base + usize::from(rank < extra);
    start.min(n)..(start + len).min(n)
}

/// 对 `0..n` 的每个单元计算 `K` 个分量并全局求和
///
/// # 示例
///
/// ```
/// use dm_runtime::reduce::partitioned_sum;
///
/// let [count, total] = partitioned_sum::<2, _>(10, 3, |i| [1.0, i as f64]);
/// assert_eq!(count, 10.0);
/// assert_eq!(total, 45.0);
/// ```
pub fn partitioned_sum<const K: usize, F>(n: usize, chunk: usize, f: F) -> [f64; K]
where
    F: Fn(usize) -> [f64; K] + Sync,
{
    let ranges: Vec<Range<usize>> = partitions(n, chunk).collect();

    let partials: Vec<[f64; K]> = ranges
        .into_par_iter()
        .map(|range| {
            let mut acc = [KahanSum::new(); K];
            for i in range {
                let values = f(i);
                for (sum, v) in acc.iter_mut().zip(values) {
                    sum.add(v);
                }
            }
            acc.map(|s| s.value())
        })
        .collect();

    let mut total = [KahanSum::new(); K];
    for part in &partials {
        for (sum, &v) in total.iter_mut().zip(part.iter()) {
            sum.add(v);
        }
    }
    total.map(|s| s.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitions_cover_range() {
        let parts: Vec<_> = partitions(10, 4).collect();
        assert_eq!(parts, vec![0..4, 4..8, 8..10]);
        assert_eq!(partitions(0, 4).count(), 0);
    }

    #[test]
    fn test_owned_ranges_disjoint_cover() {
        for (n, size) in [(10, 3), (64, 4), (2, 5), (0, 2), (7, 1)] {
            let ranges: Vec<_> = (0..size).map(|r| owned_range(n, r, size)).collect();
            let mut next = 0;
            for r in &ranges {
                assert_eq!(r.start, next);
                next = r.end;
            }
            assert_eq!(next, n);
        }
        assert_eq!(owned_range(10, 0, 3), 0..4);
        assert_eq!(owned_range(10, 2, 3), 7..10);
    }

    #[test]
    fn test_partitioned_sum_independent_of_chunk() {
        let f = |i: usize| [((i as f64) * 0.37).sin(), 1.0];
        let a = partitioned_sum::<2, _>(10_000, 7, f);
        let b = partitioned_sum::<2, _>(10_000, 7, f);
        // 相同分区大小必须逐位一致
        assert_eq!(a, b);

        let c = partitioned_sum::<2, _>(10_000, 1000, f);
        assert!((a[0] - c[0]).abs() < 1e-10);
        assert_eq!(c[1], 10_000.0);
    }
}
