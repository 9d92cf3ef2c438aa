// crates/dm_workflow/src/monitor.rs

//! 稳定性监控与判定
//!
//! # 模块概览
//!
//! ```text
//! FlowMoments::over(owned) ─> all_reduce_sum ─> GlobalDiagnostics
//!                                                    │
//!                      写者: log.dat 行 + 诊断输出 ─> settle
//!                                                    │
//!                          Classifier ─> agree ─> Verdict
//! ```
//!
//! 判定只在 `step > warmup_steps` 之后进行。体积分数总量为零时
//! 返回 [`WorkflowError::DegenerateConfiguration`]，不把 NaN 与阈值比较。

use dm_config::{ClassifierConfig, PhysicalProperties, VerdictPrecedence};
use dm_io::{LogRow, RunLog, LOG_HEADER};
use dm_physics::{FlowMoments, FlowState};
use dm_runtime::Communicator;
use glam::DVec2;

use crate::clock::SimulationClock;
use crate::collective::settle;
use crate::error::{WorkflowError, WorkflowResult};
use crate::verdict::Verdict;

// ============================================================
// 全局诊断量
// ============================================================

/// 一步的全局诊断量（所有工作者上相同）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalDiagnostics {
    /// 步号
    pub step: u64,
    /// 模拟时间
    pub time: f64,
    /// 全局动能
    pub kinetic_energy: f64,
    /// 体积分数总量
    pub mass: f64,
    /// 质心，体积分数非有限时为 NaN
    pub centroid: DVec2,
    /// 质心到原点的距离
    pub displacement: f64,
}

impl GlobalDiagnostics {
    /// 由全局矩构造
    pub fn from_moments(clock: &SimulationClock, moments: FlowMoments) -> WorkflowResult<Self> {
        let centroid = if moments.mass.is_finite() {
            moments
                .centroid()
                .ok_or(WorkflowError::DegenerateConfiguration { step: clock.step })?
        } else {
            DVec2::splat(f64::NAN)
        };
        Ok(Self {
            step: clock.step,
            time: clock.time,
            kinetic_energy: moments.kinetic_energy,
            mass: moments.mass,
            centroid,
            displacement: centroid.length(),
        })
    }

    /// 本地矩经通信器归约后构造
    pub fn reduce(
        state: &FlowState,
        props: &PhysicalProperties,
        comm: &dyn Communicator,
        clock: &SimulationClock,
    ) -> WorkflowResult<Self> {
        let local = FlowMoments::over(state, props, comm.owned(state.n_cells()));
        let global = comm.all_reduce_sum(&local.to_array())?;
        let values = <[f64; FlowMoments::LEN]>::try_from(global).map_err(|v| {
            WorkflowError::InvalidState(format!("归约结果长度 {} 不等于 {}", v.len(), FlowMoments::LEN))
        })?;
        Self::from_moments(clock, FlowMoments::from_array(values))
    }

    /// 日志行
    pub fn log_row(&self) -> LogRow {
        LogRow {
            step: self.step,
            time: self.time,
            kinetic_energy: self.kinetic_energy,
            displacement: self.displacement,
        }
    }
}

// ============================================================
// 判定
// ============================================================

/// 阈值判定器
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    /// 由配置创建
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// 判定配置
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// 给出本步判定
    ///
    /// 非有限的动能或位移总是致命；位移阈值与能量上界同时触发时按优先顺序取舍。
    pub fn classify(&self, diag: &GlobalDiagnostics) -> Verdict {
        if diag.step <= self.config.warmup_steps {
            return Verdict::Continue;
        }
        if !diag.kinetic_energy.is_finite() || !diag.displacement.is_finite() {
            return Verdict::FatalInvariant;
        }

        let moved = diag.displacement >= self.config.displacement_threshold;
        let unstable = diag.kinetic_energy >= self.config.energy_bound;

        match self.config.precedence {
            VerdictPrecedence::DisplacementFirst if moved => Verdict::Moved,
            VerdictPrecedence::DisplacementFirst if unstable => Verdict::FatalInvariant,
            VerdictPrecedence::StabilityFirst if unstable => Verdict::FatalInvariant,
            VerdictPrecedence::StabilityFirst if moved => Verdict::Moved,
            _ => Verdict::Continue,
        }
    }
}

// ============================================================
// 监控器
// ============================================================

/// 稳定性监控器：归约、日志、判定、一致性检查
#[derive(Debug, Clone)]
pub struct StabilityMonitor {
    classifier: Classifier,
    log: RunLog,
}

impl StabilityMonitor {
    /// 创建监控器
    pub fn new(classifier: Classifier, log: RunLog) -> Self {
        Self { classifier, log }
    }

    /// 判定器
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// 运行日志
    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// 观察当前状态并给出所有工作者一致的判定
    pub fn observe(
        &self,
        state: &FlowState,
        props: &PhysicalProperties,
        comm: &dyn Communicator,
        clock: &SimulationClock,
    ) -> WorkflowResult<(GlobalDiagnostics, Verdict)> {
        let diag = GlobalDiagnostics::reduce(state, props, comm, clock)?;

        let logged = if comm.is_writer() {
            self.write_log(&diag, clock)
        } else {
            Ok(())
        };
        settle(comm, logged)?;

        let verdict = self.classifier.classify(&diag);
        comm.agree(verdict.code())?;
        Ok((diag, verdict))
    }

    fn write_log(&self, diag: &GlobalDiagnostics, clock: &SimulationClock) -> WorkflowResult<()> {
        if clock.step == 0 {
            self.log.write_header()?;
            tracing::info!("{}", LOG_HEADER);
        }
        let row = diag.log_row();
        self.log.append(&row)?;
        tracing::info!("{}", row);
        Ok(())
    }
}
