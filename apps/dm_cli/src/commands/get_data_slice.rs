// apps/dm_cli/src/commands/get_data_slice.rs

//! 快照切片：把体积分数与速度插值到规则网格，每点一行 `x y f vx vy`

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dm_foundation::DmError;
use dm_io::{extract_slice, Checkpoint, IoError, SliceRequest, SliceRow};

use crate::common::CommonArgs;

/// 快照切片提取
#[derive(Parser, Debug)]
#[command(name = "get_data_slice")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpolate fraction and velocity of a snapshot onto a regular grid", long_about = None)]
pub struct SliceArgs {
    /// 快照文件
    pub file: PathBuf,
    /// x 下限
    #[arg(allow_negative_numbers = true)]
    pub xmin: f64,
    /// x 上限
    #[arg(allow_negative_numbers = true)]
    pub xmax: f64,
    /// y 下限
    #[arg(allow_negative_numbers = true)]
    pub ymin: f64,
    /// y 上限
    #[arg(allow_negative_numbers = true)]
    pub ymax: f64,
    /// x 方向分段数
    pub nx: usize,
    /// y 方向分段数
    pub ny: usize,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl SliceArgs {
    /// 切片请求
    pub fn request(&self) -> SliceRequest {
        SliceRequest {
            xmin: self.xmin,
            xmax: self.xmax,
            ymin: self.ymin,
            ymax: self.ymax,
            nx: self.nx,
            ny: self.ny,
        }
    }
}

/// 提取切片并写到 `out`
pub fn write_slice(args: &SliceArgs, out: &mut impl Write) -> Result<usize> {
    let request = args.request();
    request
        .validate()
        .map_err(DmError::from)
        .context("无效的切片参数")?;

    let state = Checkpoint::load(&args.file)
        .and_then(|ck| ck.restore())
        .map_err(|e| DmError::from(IoError::from(e)))
        .with_context(|| format!("读取快照失败: {}", args.file.display()))?;

    let rows = extract_slice(&state, &request).map_err(DmError::from)?;
    write_rows(out, &rows).map_err(|e| DmError::io_with_source("stdout", e))?;
    Ok(rows.len())
}

fn write_rows(out: &mut impl Write, rows: &[SliceRow]) -> std::io::Result<()> {
    for row in rows {
        writeln!(out, "{row}")?;
    }
    out.flush()
}

/// 执行
pub fn execute(args: SliceArgs) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let n = write_slice(&args, &mut out)?;
    tracing::debug!("写出 {} 个切片点", n);
    Ok(())
}
