// crates/dm_physics/src/lib.rs

//! DropMove Physics Layer (Layer 3)
//!
//! 表面活性剂液滴问题的物理部分：
//!
//! - [`engine`]: 求解引擎接口 `Engine`
//! - [`fields`]: `FieldKind`、`FieldSet`、`FlowState`、自适应请求
//! - [`initializer`]: 初始场 `FieldInitializer`
//! - [`coupling`]: 表面张力耦合 `PropertyCoupler`
//! - [`adaptation`]: 每步自适应策略 `AdaptationController`
//! - [`moments`]: 动能与体积分数矩
//! - [`reference`]: 参考引擎 `StokesClsvofEngine`
//!
//! # 每步数据流
//!
//! ```text
//! 浓度 ──PropertyCoupler──> 张力 ──Engine::advance──> 新状态
//!                                                  │
//!   距离 ──curvature_from_distance──> 曲率 ──AdaptationController──> 新网格
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adaptation;
pub mod coupling;
pub mod engine;
pub mod error;
pub mod fields;
pub mod initializer;
pub mod moments;
pub mod reference;

pub use adaptation::AdaptationController;
pub use coupling::PropertyCoupler;
pub use engine::Engine;
pub use error::{PhysicsError, PhysicsResult};
pub use fields::{AdaptRequest, FieldKind, FieldSet, FlowState};
pub use initializer::{fraction_from_distance, FieldInitializer};
pub use moments::FlowMoments;
pub use reference::{EngineSettings, StokesClsvofEngine, TimeStepController};
