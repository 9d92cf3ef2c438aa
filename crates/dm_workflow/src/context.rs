// crates/dm_workflow/src/context.rs

//! 模拟上下文
//!
//! 一次运行的全部可变状态集中在 [`SimulationContext`] 中，
//! 逐个传给流水线的每个阶段，不存在全局变量。

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use dm_config::{ParameterSet, PhysicalProperties};
use dm_io::{RunLog, RunStatus, SnapshotSchedule, SnapshotWriter, StatusEmitter};
use dm_mesh::AdaptStats;
use dm_physics::{AdaptationController, Engine, PropertyCoupler};
use dm_runtime::Communicator;

use crate::clock::SimulationClock;
use crate::collective::settle;
use crate::error::WorkflowResult;
use crate::monitor::{Classifier, GlobalDiagnostics, StabilityMonitor};
use crate::verdict::Verdict;

/// 状态行输出目标
pub type StatusSink = Box<dyn Write + Send>;

/// 模拟上下文
pub struct SimulationContext {
    params: ParameterSet,
    props: PhysicalProperties,
    engine: Box<dyn Engine>,
    comm: Arc<dyn Communicator>,
    clock: SimulationClock,
    coupler: PropertyCoupler,
    adaptation: AdaptationController,
    monitor: StabilityMonitor,
    snapshots: SnapshotWriter,
    status: StatusEmitter<StatusSink>,
    last: Option<GlobalDiagnostics>,
}

impl std::fmt::Debug for SimulationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationContext")
            .field("engine", &self.engine.name())
            .field("peclet", &self.params.peclet())
            .field("rank", &self.comm.rank())
            .field("clock", &self.clock)
            .finish()
    }
}

impl SimulationContext {
    /// 由参数集、引擎与通信器组装上下文
    ///
    /// 日志与快照路径取自 `output` 配置；状态行写入 `status`。
    pub fn new(
        params: ParameterSet,
        engine: Box<dyn Engine>,
        comm: Arc<dyn Communicator>,
        status: StatusSink,
    ) -> WorkflowResult<Self> {
        let config = params.config();
        let props = params.properties();
        let schedule = SnapshotSchedule::new(config.output.snapshot_interval, config.time.tmax)?;

        Ok(Self {
            coupler: PropertyCoupler::new(&props),
            adaptation: AdaptationController::new(&config.adapt),
            monitor: StabilityMonitor::new(
                Classifier::new(config.classifier.clone()),
                RunLog::new(&config.output.log_file),
            ),
            snapshots: SnapshotWriter::new(&config.output.snapshot_dir, schedule),
            status: StatusEmitter::new(status),
            clock: SimulationClock::new(),
            last: None,
            props,
            params,
            engine,
            comm,
        })
    }

    /// 参数集
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// 物性
    pub fn props(&self) -> &PhysicalProperties {
        &self.props
    }

    /// 终止时间
    pub fn tmax(&self) -> f64 {
        self.params.config().time.tmax
    }

    /// 引擎
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// 可变引擎
    pub fn engine_mut(&mut self) -> &mut dyn Engine {
        self.engine.as_mut()
    }

    /// 通信器
    pub fn comm(&self) -> &dyn Communicator {
        self.comm.as_ref()
    }

    /// 是否为写者
    pub fn is_writer(&self) -> bool {
        self.comm.is_writer()
    }

    /// 时钟
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// 可变时钟
    pub fn clock_mut(&mut self) -> &mut SimulationClock {
        &mut self.clock
    }

    /// 快照写出器
    pub fn snapshots(&self) -> &SnapshotWriter {
        &self.snapshots
    }

    /// 监控器
    pub fn monitor(&self) -> &StabilityMonitor {
        &self.monitor
    }

    /// 最近一步的全局诊断量
    pub fn last_diagnostics(&self) -> Option<&GlobalDiagnostics> {
        self.last.as_ref()
    }

    /// 已输出的状态
    pub fn emitted_status(&self) -> Option<RunStatus> {
        self.status.emitted()
    }

    /// 重新耦合张力
    pub fn recouple(&mut self) {
        self.coupler.apply(self.engine.state_mut());
    }

    /// 推进引擎一步，步长不超过 `dt_limit`
    pub fn advance_engine(&mut self, dt_limit: f64) -> WorkflowResult<f64> {
        Ok(self.engine.advance(&self.props, dt_limit)?)
    }

    /// 执行一次网格自适应
    pub fn adapt(&mut self) -> WorkflowResult<AdaptStats> {
        Ok(self.adaptation.step(self.engine.as_mut())?)
    }

    /// 观察当前状态，记录诊断量并返回判定
    pub fn observe(&mut self) -> WorkflowResult<(GlobalDiagnostics, Verdict)> {
        let (diag, verdict) = self.monitor.observe(
            self.engine.state(),
            &self.props,
            self.comm.as_ref(),
            &self.clock,
        )?;
        self.last = Some(diag);
        Ok((diag, verdict))
    }

    /// 到达计划时刻时写出快照（只有写者写文件）
    pub fn write_due_snapshot(&mut self) -> WorkflowResult<Option<PathBuf>> {
        let write = self.comm.is_writer();
        let written: WorkflowResult<_> = self
            .snapshots
            .on_step(self.engine.state(), self.clock.time, self.clock.step, write)
            .map_err(Into::into);
        settle(self.comm.as_ref(), written)
    }

    /// 准备快照目录（只有写者执行）
    pub fn prepare_outputs(&self) -> WorkflowResult<()> {
        let prepared: WorkflowResult<()> = if self.comm.is_writer() {
            self.snapshots.prepare().map_err(Into::into)
        } else {
            Ok(())
        };
        settle(self.comm.as_ref(), prepared)
    }

    /// 输出状态行（只有写者输出）
    pub fn emit_status(&mut self, status: RunStatus) -> WorkflowResult<()> {
        let emitted: WorkflowResult<()> = if self.comm.is_writer() {
            self.status.emit(status).map_err(Into::into)
        } else {
            Ok(())
        };
        settle(self.comm.as_ref(), emitted)
    }
}
