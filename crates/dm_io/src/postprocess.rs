// crates/dm_io/src/postprocess.rs

//! 快照后处理
//!
//! - [`extract_slice`]: 把体积分数与速度插值到矩形规则网格上
//! - [`sample_centroid_velocity`]: 质心处的速度

use dm_config::PhysicalProperties;
use dm_mesh::interpolate;
use dm_physics::{FieldKind, FlowMoments, FlowState};
use glam::DVec2;

use crate::error::{IoError, IoResult};

/// 采样间距相对区间长度的缩放，使最后一个点落在区间内
const SPACING_SCALE: f64 = 0.999999;

/// 规则网格切片请求
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceRequest {
    /// x 下限
    pub xmin: f64,
    /// x 上限
    pub xmax: f64,
    /// y 下限
    pub ymin: f64,
    /// y 上限
    pub ymax: f64,
    /// x 方向分段数（点数为 nx + 1）
    pub nx: usize,
    /// y 方向分段数（点数为 ny + 1）
    pub ny: usize,
}

impl SliceRequest {
    /// 检查参数
    pub fn validate(&self) -> IoResult<()> {
        let bounds = [self.xmin, self.xmax, self.ymin, self.ymax];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(IoError::InvalidArgument("切片边界必须为有限值".into()));
        }
        if self.nx == 0 || self.ny == 0 {
            return Err(IoError::InvalidArgument("nx 与 ny 必须为正整数".into()));
        }
        Ok(())
    }

    /// 采样点，x 为外层循环
    pub fn points(&self) -> Vec<DVec2> {
        let dx = SPACING_SCALE * (self.xmax - self.xmin) / self.nx as f64;
        let dy = SPACING_SCALE * (self.ymax - self.ymin) / self.ny as f64;
        (0..=self.nx)
            .flat_map(|i| {
                (0..=self.ny).map(move |j| {
                    DVec2::new(self.xmin + dx * i as f64, self.ymin + dy * j as f64)
                })
            })
            .collect()
    }
}

/// 切片中的一行
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceRow {
    /// x 坐标
    pub x: f64,
    /// y 坐标
    pub y: f64,
    /// 体积分数
    pub fraction: f64,
    /// x 方向速度
    pub vx: f64,
    /// y 方向速度
    pub vy: f64,
}

impl std::fmt::Display for SliceRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {} {}", self.x, self.y, self.fraction, self.vx, self.vy)
    }
}

/// 在规则网格上插值体积分数与速度，计算域外的点取 NaN
pub fn extract_slice(state: &FlowState, request: &SliceRequest) -> IoResult<Vec<SliceRow>> {
    request.validate()?;
    let mesh = state.mesh();
    let sample = |kind: FieldKind, p: DVec2| {
        interpolate(mesh, state.field(kind), p, kind.boundary()).unwrap_or(f64::NAN)
    };
    Ok(request
        .points()
        .into_iter()
        .map(|p| SliceRow {
            x: p.x,
            y: p.y,
            fraction: sample(FieldKind::Fraction, p),
            vx: sample(FieldKind::VelocityX, p),
            vy: sample(FieldKind::VelocityY, p),
        })
        .collect())
}

/// 质心速度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentroidVelocity {
    /// x 方向速度
    pub vx: f64,
    /// y 方向速度
    pub vy: f64,
    /// 快照时间
    pub time: f64,
}

impl std::fmt::Display for CentroidVelocity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6} {:.6} {:.6}", self.vx, self.vy, self.time)
    }
}

/// 体积分数加权质心处插值得到的速度
pub fn sample_centroid_velocity(
    state: &FlowState,
    props: &PhysicalProperties,
    time: f64,
) -> IoResult<CentroidVelocity> {
    let centroid = FlowMoments::local(state, props)
        .centroid()
        .ok_or(IoError::DegenerateConfiguration)?;
    let mesh = state.mesh();
    let at = |kind: FieldKind| {
        interpolate(mesh, state.field(kind), centroid, kind.boundary()).ok_or_else(|| {
            IoError::InvalidArgument(format!("质心 ({}, {}) 位于计算域外", centroid.x, centroid.y))
        })
    };
    Ok(CentroidVelocity {
        vx: at(FieldKind::VelocityX)?,
        vy: at(FieldKind::VelocityY)?,
        time,
    })
}
