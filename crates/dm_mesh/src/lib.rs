// crates/dm_mesh/src/lib.rs

//! DropMove Mesh Layer (Layer 2)
//!
//! 正方形计算域上的四叉树自适应网格。
//!
//! # 模块概览
//!
//! - [`cell`]: 单元标识 `CellId` 与面方向
//! - [`domain`]: 计算域几何
//! - [`tree`]: `AdaptiveMesh`（叶单元存储、点定位、跨级取值）
//! - [`field`]: `ScalarField`、边界条件、加密取值方式
//! - [`stencil`]: 梯度、拉普拉斯、由距离场计算曲率
//! - [`interpolate`]: 双线性插值
//! - [`adapt`]: 小波误差估计、自适应计划与执行、2:1 平衡
//!
//! # 数据布局
//!
//! ```text
//! AdaptiveMesh.leaves[k]  <──>  ScalarField.values[k]
//!        │
//!        └── 非叶单元值：注入（被覆盖）或子单元平均（包含叶单元）
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapt;
pub mod cell;
pub mod domain;
pub mod error;
pub mod field;
pub mod interpolate;
pub mod stencil;
pub mod tree;

/// 支持的最大细化级别
pub const MAX_LEVEL: u8 = 16;

pub use adapt::{
    plan_adaptation, wavelet_error, AdaptLimits, AdaptPlan, AdaptStats, Criterion, FieldLayer,
};
pub use cell::{CellId, Direction};
pub use domain::Domain;
pub use error::{MeshError, MeshResult};
pub use field::{Boundary, Prolongation, ScalarField};
pub use interpolate::interpolate;
pub use stencil::{curvature_from_distance, gradient, gradient_field, laplacian};
pub use tree::AdaptiveMesh;
