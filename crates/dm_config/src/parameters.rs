// crates/dm_config/src/parameters.rs

//! 无量纲参数集
//!
//! Péclet 数是唯一的运行时输入，其余参数均来自 [`SimulationConfig`]。
//! 由参数集导出两相物性：
//!
//! - 密度（两相相同）`rho = 4 / Oh²`
//! - 粘度（两相相同）`mu = 1`
//! - 表面活性剂扩散系数 `D = 1 / Pe`
//! - 表面张力 `sigma(c) = 1/Ca + k·c`

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::simulation_config::SimulationConfig;

/// 解析命令行中的 Péclet 数
///
/// 缺失、无法解析、非有限或非正值都会返回错误。
pub fn parse_peclet(raw: Option<&str>) -> ConfigResult<f64> {
    let raw = raw.ok_or_else(|| ConfigError::Missing("Péclet 数 (Pe)".into()))?;
    let pe: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid("pe", raw, "不是合法的数值"))?;
    check_peclet(pe)?;
    Ok(pe)
}

fn check_peclet(pe: f64) -> ConfigResult<()> {
    if pe.is_finite() && pe > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid("pe", pe, "必须为有限正数"))
    }
}

/// 完整参数集：Pe + 运行配置
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    peclet: f64,
    config: SimulationConfig,
}

impl ParameterSet {
    /// 创建参数集，同时验证 Pe 与配置
    pub fn new(config: SimulationConfig, peclet: f64) -> ConfigResult<Self> {
        check_peclet(peclet)?;
        config.validate()?;
        Ok(Self { peclet, config })
    }

    /// 默认配置下的参数集
    pub fn with_peclet(peclet: f64) -> ConfigResult<Self> {
        Self::new(SimulationConfig::default(), peclet)
    }

    /// Péclet 数
    #[inline]
    pub fn peclet(&self) -> f64 {
        self.peclet
    }

    /// 运行配置
    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// 导出物性参数
    pub fn properties(&self) -> PhysicalProperties {
        let p = &self.config.physics;
        let rho = 4.0 / (p.ohnesorge * p.ohnesorge);
        PhysicalProperties {
            rho1: rho,
            rho2: rho,
            mu1: 1.0,
            mu2: 1.0,
            diffusivity: 1.0 / self.peclet,
            flux: p.surfactant_flux,
            tension_base: 1.0 / p.capillary,
            tension_coupling: p.tension_coupling,
        }
    }
}

/// 两相物性参数
///
/// 下标 1 为液滴内部相（f = 1），下标 2 为外部相（f = 0）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalProperties {
    /// 内部相密度
    pub rho1: f64,
    /// 外部相密度
    pub rho2: f64,
    /// 内部相粘度
    pub mu1: f64,
    /// 外部相粘度
    pub mu2: f64,
    /// 表面活性剂扩散系数
    pub diffusivity: f64,
    /// 界面通量常数 Ac
    pub flux: f64,
    /// 基础张力 1/Ca
    pub tension_base: f64,
    /// 张力耦合常数 k
    pub tension_coupling: f64,
}

impl PhysicalProperties {
    /// 按体积分数插值密度
    #[inline]
    pub fn density(&self, fraction: f64) -> f64 {
        let f = fraction.clamp(0.0, 1.0);
        f * self.rho1 + (1.0 - f) * self.rho2
    }

    /// 按体积分数插值粘度
    #[inline]
    pub fn viscosity(&self, fraction: f64) -> f64 {
        let f = fraction.clamp(0.0, 1.0);
        f * self.mu1 + (1.0 - f) * self.mu2
    }

    /// 浓度对应的表面张力
    #[inline]
    pub fn tension_of(&self, concentration: f64) -> f64 {
        self.tension_base + self.tension_coupling * concentration
    }
}
