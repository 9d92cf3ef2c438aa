// crates/dm_io/src/lib.rs

//! DropMove IO Layer (Layer 4)
//!
//! 所有文件与标准输出交互都集中在本层。
//!
//! # 模块概览
//!
//! - [`checkpoint`]: 二进制检查点 (`DMCK` v1, CRC32 校验)
//! - [`snapshot`]: 快照时间表与写出器
//! - [`run_log`]: 运行日志 `log.dat`
//! - [`status`]: `STATUS MOVED` / `STATUS NOT_MOVED` 状态行
//! - [`postprocess`]: 切片插值与质心速度
//! - [`error`]: IO 错误类型

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod error;
pub mod postprocess;
pub mod run_log;
pub mod snapshot;
pub mod status;

pub use checkpoint::{Checkpoint, CheckpointError, CheckpointHeader, CheckpointResult};
pub use error::{IoError, IoResult};
pub use postprocess::{
    extract_slice, sample_centroid_velocity, CentroidVelocity, SliceRequest, SliceRow,
};
pub use run_log::{LogRow, RunLog, LOG_HEADER};
pub use snapshot::{SnapshotSchedule, SnapshotWriter, TIME_EPS};
pub use status::{RunStatus, StatusEmitter};
