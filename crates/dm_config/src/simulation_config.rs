// crates/dm_config/src/simulation_config.rs

//! SimulationConfig - 运行配置（全 f64）
//!
//! 除 Péclet 数之外的所有参数都来自这里。每个字段都有 serde 默认值，
//! 所以空 JSON 对象 `{}` 就是一份完整、有效的配置。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// 允许的最大细化级别（单元索引用 u32 表示）
pub const LEVEL_CEILING: u8 = 16;

/// 快照间隔下限，保证按时间命名的快照文件不会重名
pub const MIN_SNAPSHOT_INTERVAL: f64 = 1e-4;

/// 运行配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 物理参数
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// 计算域
    #[serde(default)]
    pub domain: DomainConfig,

    /// 网格自适应
    #[serde(default)]
    pub adapt: AdaptConfig,

    /// 判定器阈值
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// 输出
    #[serde(default)]
    pub output: OutputConfig,

    /// 时间推进
    #[serde(default)]
    pub time: TimeConfig,

    /// 参考引擎的迭代参数
    #[serde(default)]
    pub solver: SolverConfig,
}

// ============================================================
// 物理参数
// ============================================================

/// 无量纲物理参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Ohnesorge 数 Oh
    #[serde(default = "default_ohnesorge")]
    pub ohnesorge: f64,

    /// 毛细数 Ca
    #[serde(default = "default_capillary")]
    pub capillary: f64,

    /// 表面活性剂通量数 Ac
    #[serde(default = "default_surfactant_flux")]
    pub surfactant_flux: f64,

    /// 张力耦合常数 k：`sigma = 1/Ca + k * c`
    #[serde(default = "default_tension_coupling")]
    pub tension_coupling: f64,

    /// 初始浓度基线
    #[serde(default)]
    pub baseline_concentration: f64,

    /// 初始液滴半径
    #[serde(default = "default_droplet_radius")]
    pub droplet_radius: f64,
}

fn default_ohnesorge() -> f64 { 1.0 }
fn default_capillary() -> f64 { 0.1 }
fn default_surfactant_flux() -> f64 { 1.0 }
fn default_tension_coupling() -> f64 { 4.0 }
fn default_droplet_radius() -> f64 { 1.0 }

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            ohnesorge: default_ohnesorge(),
            capillary: default_capillary(),
            surfactant_flux: default_surfactant_flux(),
            tension_coupling: default_tension_coupling(),
            baseline_concentration: 0.0,
            droplet_radius: default_droplet_radius(),
        }
    }
}

// ============================================================
// 计算域
// ============================================================

/// 计算域配置（以原点为中心的正方形）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// 边长 L0
    #[serde(default = "default_domain_size")]
    pub size: f64,
}

fn default_domain_size() -> f64 { 10.0 }

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            size: default_domain_size(),
        }
    }
}

impl DomainConfig {
    /// 半宽 L0/2
    pub fn half_width(&self) -> f64 {
        0.5 * self.size
    }
}

// ============================================================
// 网格自适应
// ============================================================

/// 自适应细化配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptConfig {
    /// 最小细化级别
    #[serde(default)]
    pub min_level: u8,

    /// 最大细化级别
    #[serde(default = "default_max_level")]
    pub max_level: u8,

    /// 体积分数容差
    #[serde(default = "default_tolerance")]
    pub fraction_tolerance: f64,

    /// 速度分量容差
    #[serde(default = "default_tolerance")]
    pub velocity_tolerance: f64,

    /// 浓度容差
    #[serde(default = "default_tolerance")]
    pub concentration_tolerance: f64,

    /// 曲率容差
    #[serde(default = "default_tolerance")]
    pub curvature_tolerance: f64,
}

fn default_max_level() -> u8 { 9 }
fn default_tolerance() -> f64 { 1e-3 }

impl Default for AdaptConfig {
    fn default() -> Self {
        Self {
            min_level: 0,
            max_level: default_max_level(),
            fraction_tolerance: default_tolerance(),
            velocity_tolerance: default_tolerance(),
            concentration_tolerance: default_tolerance(),
            curvature_tolerance: default_tolerance(),
        }
    }
}

// ============================================================
// 判定器
// ============================================================

/// 位移判据与能量判据同时成立时的优先顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerdictPrecedence {
    /// 先检查位移（MOVED 优先）
    #[default]
    DisplacementFirst,
    /// 先检查能量上界（FATAL 优先）
    StabilityFirst,
}

/// 判定器阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// 质心位移阈值
    #[serde(default = "default_displacement_threshold")]
    pub displacement_threshold: f64,

    /// 预热步数，步号大于该值后才做判定
    #[serde(default = "default_warmup_steps")]
    pub warmup_steps: u64,

    /// 动能上界
    #[serde(default = "default_energy_bound")]
    pub energy_bound: f64,

    /// 判据优先顺序
    #[serde(default)]
    pub precedence: VerdictPrecedence,
}

fn default_displacement_threshold() -> f64 { 1.0 }
fn default_warmup_steps() -> u64 { 10 }
fn default_energy_bound() -> f64 { 1e3 }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            displacement_threshold: default_displacement_threshold(),
            warmup_steps: default_warmup_steps(),
            energy_bound: default_energy_bound(),
            precedence: VerdictPrecedence::default(),
        }
    }
}

// ============================================================
// 输出
// ============================================================

/// 输出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 快照目录（每次运行开始时重建）
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// 快照间隔
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: f64,

    /// 日志文件
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_snapshot_dir() -> PathBuf { PathBuf::from("intermediate") }
fn default_snapshot_interval() -> f64 { 0.1 }
fn default_log_file() -> PathBuf { PathBuf::from("log.dat") }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
            snapshot_interval: default_snapshot_interval(),
            log_file: default_log_file(),
        }
    }
}

// ============================================================
// 时间推进
// ============================================================

/// 时间推进配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 最大模拟时间
    #[serde(default = "default_tmax")]
    pub tmax: f64,

    /// 最大时间步长
    #[serde(default = "default_dt_max")]
    pub dt_max: f64,

    /// CFL 数
    #[serde(default = "default_cfl")]
    pub cfl: f64,
}

fn default_tmax() -> f64 { 50.0 }
fn default_dt_max() -> f64 { 1e-2 }
fn default_cfl() -> f64 { 0.5 }

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            tmax: default_tmax(),
            dt_max: default_dt_max(),
            cfl: default_cfl(),
        }
    }
}

// ============================================================
// 参考引擎
// ============================================================

/// 参考引擎迭代参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 压力投影 Jacobi 迭代次数
    #[serde(default = "default_projection_iterations")]
    pub projection_iterations: usize,

    /// 隐式扩散/粘性 Jacobi 迭代次数
    #[serde(default = "default_diffusion_iterations")]
    pub diffusion_iterations: usize,
}

fn default_projection_iterations() -> usize { 60 }
fn default_diffusion_iterations() -> usize { 20 }

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            projection_iterations: default_projection_iterations(),
            diffusion_iterations: default_diffusion_iterations(),
        }
    }
}

// ============================================================
// 加载与验证
// ============================================================

impl SimulationConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;

        let config: SimulationConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> ConfigResult<()> {
        let p = &self.physics;
        positive("physics.ohnesorge", p.ohnesorge)?;
        positive("physics.capillary", p.capillary)?;
        finite("physics.surfactant_flux", p.surfactant_flux)?;
        finite("physics.tension_coupling", p.tension_coupling)?;
        finite("physics.baseline_concentration", p.baseline_concentration)?;
        positive("physics.droplet_radius", p.droplet_radius)?;

        positive("domain.size", self.domain.size)?;
        if p.droplet_radius >= self.domain.half_width() {
            return Err(ConfigError::invalid(
                "physics.droplet_radius",
                p.droplet_radius,
                "液滴必须完整位于计算域内",
            ));
        }

        let a = &self.adapt;
        if a.max_level > LEVEL_CEILING {
            return Err(ConfigError::invalid(
                "adapt.max_level",
                a.max_level,
                format!("不能超过 {LEVEL_CEILING}"),
            ));
        }
        if a.min_level > a.max_level {
            return Err(ConfigError::invalid(
                "adapt.min_level",
                a.min_level,
                "不能大于 adapt.max_level",
            ));
        }
        positive("adapt.fraction_tolerance", a.fraction_tolerance)?;
        positive("adapt.velocity_tolerance", a.velocity_tolerance)?;
        positive("adapt.concentration_tolerance", a.concentration_tolerance)?;
        positive("adapt.curvature_tolerance", a.curvature_tolerance)?;

        let c = &self.classifier;
        positive("classifier.displacement_threshold", c.displacement_threshold)?;
        positive("classifier.energy_bound", c.energy_bound)?;

        if !(self.output.snapshot_interval >= MIN_SNAPSHOT_INTERVAL)
            || !self.output.snapshot_interval.is_finite()
        {
            return Err(ConfigError::invalid(
                "output.snapshot_interval",
                self.output.snapshot_interval,
                format!("必须为有限值且不小于 {MIN_SNAPSHOT_INTERVAL}"),
            ));
        }

        positive("time.tmax", self.time.tmax)?;
        positive("time.dt_max", self.time.dt_max)?;
        if !(self.time.cfl > 0.0 && self.time.cfl <= 1.0) {
            return Err(ConfigError::invalid(
                "time.cfl",
                self.time.cfl,
                "CFL 必须在 (0, 1] 范围内",
            ));
        }

        if self.solver.projection_iterations == 0 {
            return Err(ConfigError::invalid("solver.projection_iterations", 0, "至少迭代一次"));
        }
        if self.solver.diffusion_iterations == 0 {
            return Err(ConfigError::invalid("solver.diffusion_iterations", 0, "至少迭代一次"));
        }

        Ok(())
    }
}

fn positive(key: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "必须为有限正数"))
    }
}

fn finite(key: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "必须为有限值"))
    }
}
