// crates/dm_workflow/tests/common/mod.rs

//! 集成测试公用设施：脚本化引擎、共享输出缓冲、小规模配置

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use dm_config::{ParameterSet, PhysicalProperties, SimulationConfig};
use dm_mesh::{AdaptiveMesh, Domain};
use dm_physics::{fraction_from_distance, Engine, FieldKind, FlowState, PhysicsResult};
use dm_runtime::Communicator;
use dm_workflow::{RunSummary, Simulation, SimulationContext, WorkflowResult};
use parking_lot::Mutex;

/// 测试网格级别（16×16）
pub const TEST_LEVEL: u8 = 4;

/// 小规模配置：均匀网格、短 tmax，输出写入 `dir`
pub fn test_config(dir: &Path) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.adapt.min_level = TEST_LEVEL;
    config.adapt.max_level = TEST_LEVEL;
    config.time.tmax = 0.2;
    config.output.snapshot_interval = 0.05;
    config.output.snapshot_dir = dir.join("intermediate");
    config.output.log_file = dir.join("log.dat");
    config
}

/// 第 `step` 次推进后的目标 (动能, 质心 x)
pub type Script = Box<dyn Fn(u64) -> (f64, f64) + Send>;

/// 按脚本改写状态的测试引擎
///
/// 每次推进把液滴放到 `(x, 0)` 处，并施加均匀速度使全局动能等于脚本值。
pub struct ScriptedEngine {
    state: FlowState,
    dt: f64,
    advances: u64,
    radius: f64,
    script: Script,
}

impl ScriptedEngine {
    /// 创建引擎，固定步长 `dt`
    pub fn new(config: &SimulationConfig, dt: f64, script: Script) -> Self {
        let mesh = AdaptiveMesh::uniform(Domain::centered(config.domain.size), TEST_LEVEL).unwrap();
        Self {
            state: FlowState::new(mesh),
            dt,
            advances: 0,
            radius: config.physics.droplet_radius,
            script,
        }
    }

    /// 静止、对称的液滴
    pub fn at_rest(config: &SimulationConfig, dt: f64) -> Self {
        Self::new(config, dt, Box::new(|_| (0.0, 0.0)))
    }

    fn place(&mut self, props: &PhysicalProperties, kinetic_energy: f64, x: f64) {
        let n = self.state.n_cells();
        let mesh = self.state.mesh().clone();
        let area: f64 = (0..n).map(|k| mesh.cell_area(k)).sum();
        let speed = (2.0 * kinetic_energy / (props.density(1.0) * area)).sqrt();

        for k in 0..n {
            let c = mesh.center(k);
            let d = self.radius - (c - glam::DVec2::new(x, 0.0)).length();
            self.state.field_mut(FieldKind::Distance)[k] = d;
            self.state.field_mut(FieldKind::Fraction)[k] = fraction_from_distance(d, mesh.cell_size(k));
            self.state.field_mut(FieldKind::VelocityX)[k] = speed;
            self.state.field_mut(FieldKind::VelocityY)[k] = 0.0;
        }
    }
}

impl Engine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn state(&self) -> &FlowState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FlowState {
        &mut self.state
    }

    fn advance(&mut self, props: &PhysicalProperties, dt_limit: f64) -> PhysicsResult<f64> {
        self.advances += 1;
        let (ke, x) = (self.script)(self.advances);
        self.place(props, ke, x);
        Ok(self.dt.min(dt_limit))
    }
}

/// 可共享的内存输出
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// 已写入的文本
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// 非空行
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_owned)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// 运行一次模拟，返回结果与状态输出
pub fn run_with(
    config: SimulationConfig,
    peclet: f64,
    engine: Box<dyn Engine>,
    comm: Arc<dyn Communicator>,
) -> (WorkflowResult<RunSummary>, SharedBuffer) {
    let params = ParameterSet::new(config, peclet).unwrap();
    let status = SharedBuffer::default();
    let ctx = SimulationContext::new(params, engine, comm, Box::new(status.clone())).unwrap();
    (Simulation::new(ctx).run(), status)
}

/// 日志文件的数据行（去掉表头）
pub fn log_rows(path: &Path) -> Vec<Vec<String>> {
    let text = std::fs::read_to_string(path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(dm_io::LOG_HEADER));
    lines
        .map(|l| l.split_whitespace().map(str::to_owned).collect())
        .collect()
}
