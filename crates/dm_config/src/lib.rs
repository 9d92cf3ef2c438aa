// crates/dm_config/src/lib.rs

//! DropMove Config Layer (Layer 2)
//!
//! 运行配置与无量纲参数集。
//!
//! # 模块概览
//!
//! - [`simulation_config`]: `SimulationConfig` 及各配置段（serde JSON，带默认值）
//! - [`parameters`]: `ParameterSet`、`PhysicalProperties`、Pe 解析
//! - [`error`]: 配置错误类型
//!
//! # 使用示例
//!
//! ```
//! use dm_config::{parse_peclet, ParameterSet, SimulationConfig};
//!
//! let pe = parse_peclet(Some("1.0")).unwrap();
//! let params = ParameterSet::new(SimulationConfig::default(), pe).unwrap();
//! assert_eq!(params.properties().diffusivity, 1.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod parameters;
pub mod simulation_config;

pub use error::{ConfigError, ConfigResult};
pub use parameters::{parse_peclet, ParameterSet, PhysicalProperties};
pub use simulation_config::{
    AdaptConfig, ClassifierConfig, DomainConfig, OutputConfig, PhysicsConfig, SimulationConfig,
    SolverConfig, TimeConfig, VerdictPrecedence, LEVEL_CEILING, MIN_SNAPSHOT_INTERVAL,
};
