// crates/dm_physics/src/reference/mod.rs

//! 参考引擎实现
//!
//! - [`stokes`]: `StokesClsvofEngine`
//! - [`timestep`]: 自适应时间步
//! - [`transport`]: 平流与隐式扩散

pub mod stokes;
pub mod timestep;
pub mod transport;

pub use stokes::{EngineSettings, StokesClsvofEngine};
pub use timestep::TimeStepController;
