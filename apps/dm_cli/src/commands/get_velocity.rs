// apps/dm_cli/src/commands/get_velocity.rs

//! 快照质心速度：输出一行 `vx vy t`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dm_config::ParameterSet;
use dm_foundation::DmError;
use dm_io::{sample_centroid_velocity, Checkpoint, CheckpointError, CentroidVelocity, IoError};

use crate::common::CommonArgs;

/// 质心速度提取
#[derive(Parser, Debug)]
#[command(name = "get_velocity")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Report the velocity at the droplet centroid of a snapshot", long_about = None)]
pub struct VelocityArgs {
    /// 快照文件
    pub file: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// 读取快照并计算质心速度
pub fn centroid_velocity(args: &VelocityArgs) -> Result<CentroidVelocity> {
    let config = args.common.load_config()?;
    // Pe 只决定扩散系数，这里不参与计算
    let props = ParameterSet::new(config, 1.0)
        .map_err(DmError::from)?
        .properties();

    let snapshot = |e: CheckpointError| DmError::from(IoError::from(e));
    let checkpoint = Checkpoint::load(&args.file)
        .map_err(snapshot)
        .with_context(|| format!("读取快照失败: {}", args.file.display()))?;
    let state = checkpoint
        .restore()
        .map_err(snapshot)
        .with_context(|| format!("快照内容无效: {}", args.file.display()))?;
    let velocity = sample_centroid_velocity(&state, &props, checkpoint.time)
        .map_err(DmError::from)
        .with_context(|| format!("无法计算质心速度: {}", args.file.display()))?;
    Ok(velocity)
}

/// 执行
pub fn execute(args: VelocityArgs) -> Result<()> {
    println!("{}", centroid_velocity(&args)?);
    Ok(())
}
