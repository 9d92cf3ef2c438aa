// crates/dm_io/src/snapshot.rs

//! 周期快照
//!
//! 快照时刻为 `0, Δ, 2Δ, ...` 直到 tmax（含），每个时刻写出一个检查点，
//! 文件名由计划时刻决定（`snapshot-00000.1000`），唯一且按字典序即时间序。
//! 驱动层据 [`SnapshotSchedule::next_time`] 限制引擎步长，使计划时刻被精确命中。

use std::path::{Path, PathBuf};

use dm_config::MIN_SNAPSHOT_INTERVAL;
use dm_physics::FlowState;

use crate::checkpoint::Checkpoint;
use crate::error::{IoError, IoResult};

/// 时间比较容差
pub const TIME_EPS: f64 = 1e-9;

/// 快照时间表
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSchedule {
    interval: f64,
    tmax: f64,
    next_index: u64,
}

impl SnapshotSchedule {
    /// 创建时间表，间隔必须为有限值且不小于 [`MIN_SNAPSHOT_INTERVAL`]
    pub fn new(interval: f64, tmax: f64) -> IoResult<Self> {
        if !interval.is_finite() || interval < MIN_SNAPSHOT_INTERVAL {
            return Err(IoError::InvalidArgument(format!(
                "快照间隔 {interval} 小于下限 {MIN_SNAPSHOT_INTERVAL}"
            )));
        }
        if !tmax.is_finite() || tmax < 0.0 {
            return Err(IoError::InvalidArgument(format!("无效的 tmax: {tmax}")));
        }
        Ok(Self {
            interval,
            tmax,
            next_index: 0,
        })
    }

    /// 快照间隔
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// 第 `index` 个快照时刻
    #[inline]
    pub fn time_of(&self, index: u64) -> f64 {
        index as f64 * self.interval
    }

    /// 下一个尚未触发的快照时刻
    pub fn next_time(&self) -> Option<f64> {
        let t = self.time_of(self.next_index);
        (t <= self.tmax + TIME_EPS).then_some(t)
    }

    /// 若时间 `time` 已到达计划时刻则触发，返回被触发的计划时刻
    ///
    /// 一次越过多个计划时刻时只触发最后一个。
    pub fn take_due(&mut self, time: f64) -> Option<f64> {
        let mut fired = None;
        let mut skipped = 0usize;
        while let Some(t) = self.next_time() {
            if t > time + TIME_EPS {
                break;
            }
            if fired.is_some() {
                skipped += 1;
            }
            fired = Some(t);
            self.next_index += 1;
        }
        if skipped > 0 {
            log::warn!("时间 {time} 越过了 {skipped} 个快照时刻");
        }
        fired
    }

    /// 全部计划时刻
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0u64..)
            .map(|i| self.time_of(i))
            .take_while(|&t| t <= self.tmax + TIME_EPS)
    }

    /// 计划时刻对应的文件名
    pub fn file_name(time: f64) -> String {
        format!("snapshot-{:010.4}", time)
    }
}

/// 快照写出器
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    directory: PathBuf,
    schedule: SnapshotSchedule,
}

impl SnapshotWriter {
    /// 创建写出器
    pub fn new(directory: impl Into<PathBuf>, schedule: SnapshotSchedule) -> Self {
        Self {
            directory: directory.into(),
            schedule,
        }
    }

    /// 快照目录
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// 时间表
    pub fn schedule(&self) -> &SnapshotSchedule {
        &self.schedule
    }

    /// 删除并重建快照目录
    pub fn prepare(&self) -> IoResult<()> {
        if self.directory.exists() {
            std::fs::remove_dir_all(&self.directory)
                .map_err(|e| IoError::file(&self.directory, e))?;
        }
        std::fs::create_dir_all(&self.directory).map_err(|e| IoError::file(&self.directory, e))?;
        Ok(())
    }

    /// 到达计划时刻时写出快照
    ///
    /// 时间表在所有工作者上推进，只有 `write` 为真时才写文件。
    pub fn on_step(
        &mut self,
        state: &FlowState,
        time: f64,
        step: u64,
        write: bool,
    ) -> IoResult<Option<PathBuf>> {
        let Some(scheduled) = self.schedule.take_due(time) else {
            return Ok(None);
        };
        if !write {
            return Ok(None);
        }
        let path = self.directory.join(SnapshotSchedule::file_name(scheduled));
        Checkpoint::from_state(state, time, step).save(&path)?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_times() {
        let s = SnapshotSchedule::new(0.1, 0.5).unwrap();
        let times: Vec<f64> = s.times().collect();
        assert_eq!(times.len(), 6);
        for pair in times.windows(2) {
            assert!((pair[1] - pair[0] - 0.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_take_due() {
        let mut s = SnapshotSchedule::new(0.1, 1.0).unwrap();
        assert_eq!(s.take_due(0.0), Some(0.0));
        assert_eq!(s.take_due(0.0), None);
        assert_eq!(s.take_due(0.05), None);
        assert!((s.take_due(0.1).unwrap() - 0.1).abs() < 1e-12);
        // 越过两个时刻只触发最后一个
        assert!((s.take_due(0.35).unwrap() - 0.3).abs() < 1e-12);
        assert!((s.next_time().unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_tmax_inclusive() {
        let mut s = SnapshotSchedule::new(0.25, 1.0).unwrap();
        for t in [0.0, 0.25, 0.5, 0.75, 1.0] {
            assert_eq!(s.take_due(t), Some(t));
        }
        assert_eq!(s.next_time(), None);
    }

    #[test]
    fn test_file_names_unique_and_sorted() {
        let s = SnapshotSchedule::new(1e-4, 0.01).unwrap();
        let names: Vec<String> = s.times().map(SnapshotSchedule::file_name).collect();
        assert_eq!(SnapshotSchedule::file_name(0.1), "snapshot-00000.1000");
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, names);
    }

    #[test]
    fn test_interval_lower_bound() {
        assert!(SnapshotSchedule::new(1e-5, 1.0).is_err());
        assert!(SnapshotSchedule::new(f64::NAN, 1.0).is_err());
        assert!(SnapshotSchedule::new(0.1, -1.0).is_err());
    }

    #[test]
    fn test_prepare_recreates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("intermediate");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("stale"), b"old").unwrap();

        let writer = SnapshotWriter::new(&out, SnapshotSchedule::new(0.1, 1.0).unwrap());
        writer.prepare().unwrap();
        assert!(out.is_dir());
        assert!(!out.join("stale").exists());
    }
}
