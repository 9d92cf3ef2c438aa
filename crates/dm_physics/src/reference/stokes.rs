// crates/dm_physics/src/reference/stokes.rs

//! 参考引擎：Stokes 流 + 距离场/体积分数界面 + 表面活性剂输运
//!
//! 叶单元中心同位网格上的分步格式，每步依次执行：
//!
//! ```text
//! 时间步 ─> 界面平流 ─> 浓度 (平流 + 源项 + 隐式扩散)
//!        ─> 曲率 ─> 动量 (CSF + Marangoni + 隐式粘性) ─> 压力投影
//! ```
//!
//! 两相密度与粘度相同，不含对流动量项。

use dm_config::{ParameterSet, PhysicalProperties, SimulationConfig};
use dm_mesh::{gradient, AdaptiveMesh, Boundary, Domain, ScalarField};
use glam::DVec2;
use rayon::prelude::*;

use crate::engine::Engine;
use crate::error::PhysicsResult;
use crate::fields::{FieldKind, FlowState};
use crate::initializer::fraction_from_distance;
use crate::reference::timestep::TimeStepController;
use crate::reference::transport::{advect, departure_points, ImplicitDiffusion};

/// 界面法向计算的梯度下限
const NORMAL_EPS: f64 = 1e-10;

/// 参考引擎的数值参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// CFL 数
    pub cfl: f64,
    /// 最大时间步长
    pub dt_max: f64,
    /// 压力投影迭代次数
    pub projection_iterations: usize,
    /// 隐式扩散/粘性迭代次数
    pub diffusion_iterations: usize,
}

impl EngineSettings {
    /// 从运行配置提取
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            cfl: config.time.cfl,
            dt_max: config.time.dt_max,
            projection_iterations: config.solver.projection_iterations,
            diffusion_iterations: config.solver.diffusion_iterations,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

/// 参考引擎
#[derive(Debug, Clone)]
pub struct StokesClsvofEngine {
    state: FlowState,
    settings: EngineSettings,
    timestep: TimeStepController,
}

impl StokesClsvofEngine {
    /// 按参数集创建：以原点为中心的计算域，均匀加密到最大级别，场全部为零
    ///
    /// 初始值由 [`crate::FieldInitializer`] 写入。
    pub fn new(params: &ParameterSet) -> PhysicsResult<Self> {
        let config = params.config();
        let domain = Domain::centered(config.domain.size);
        let mesh = AdaptiveMesh::uniform(domain, config.adapt.max_level)?;
        Ok(Self::from_state(
            FlowState::new(mesh),
            EngineSettings::from_config(config),
        ))
    }

    /// 由已有状态创建（例如从检查点恢复）
    pub fn from_state(state: FlowState, settings: EngineSettings) -> Self {
        Self {
            state,
            timestep: TimeStepController::new(settings.cfl, settings.dt_max),
            settings,
        }
    }

    /// 数值参数
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// 取出状态
    pub fn into_state(self) -> FlowState {
        self.state
    }

    fn transport_interface(&mut self, departures: &[DVec2]) {
        let mesh = self.state.mesh();
        let distance = advect(
            mesh,
            self.state.field(FieldKind::Distance),
            departures,
            FieldKind::Distance.boundary(),
        );
        let fraction = ScalarField::from_vec(
            (0..mesh.len())
                .into_par_iter()
                .map(|k| fraction_from_distance(distance[k], mesh.cell_size(k)))
                .collect(),
        );
        let fields = self.state.fields_mut();
        fields.replace(FieldKind::Distance, distance);
        fields.replace(FieldKind::Fraction, fraction);
    }

    fn transport_surfactant(&mut self, props: &PhysicalProperties, dt: f64, departures: &[DVec2]) {
        let mesh = self.state.mesh();
        let bc = FieldKind::Concentration.boundary();
        let fraction = self.state.field(FieldKind::Fraction);
        let advected = advect(mesh, self.state.field(FieldKind::Concentration), departures, bc);

        // 界面源项 Ac·|∇f|
        let rhs = ScalarField::from_vec(
            (0..mesh.len())
                .into_par_iter()
                .map(|k| {
                    let grad_f = gradient(mesh, fraction, k, FieldKind::Fraction.boundary());
                    advected[k] + dt * props.flux * grad_f.length()
                })
                .collect(),
        );

        // 扩散仅作用于外部相
        let coefficient: Vec<f64> = fraction
            .as_slice()
            .par_iter()
            .map(|&f| dt * props.diffusivity * (1.0 - f.clamp(0.0, 1.0)))
            .collect();

        let concentration = ImplicitDiffusion {
            coefficient: &coefficient,
            boundary: bc,
            iterations: self.settings.diffusion_iterations,
        }
        .solve(mesh, &rhs);
        self.state
            .fields_mut()
            .replace(FieldKind::Concentration, concentration);
    }

    fn momentum(&mut self, props: &PhysicalProperties, dt: f64) {
        let mesh = self.state.mesh();
        let fraction = self.state.field(FieldKind::Fraction);
        let tension = self.state.field(FieldKind::Tension);
        let kappa = self.state.field(FieldKind::Curvature);
        let u = self.state.field(FieldKind::VelocityX);
        let v = self.state.field(FieldKind::VelocityY);

        let forced: Vec<(f64, f64)> = (0..mesh.len())
            .into_par_iter()
            .map(|k| {
                let grad_f = gradient(mesh, fraction, k, FieldKind::Fraction.boundary());
                let mag = grad_f.length();
                let mut force = tension[k] * kappa[k] * grad_f;
                if mag > NORMAL_EPS {
                    let n = grad_f / mag;
                    let grad_sigma = gradient(mesh, tension, k, FieldKind::Tension.boundary());
                    force += (grad_sigma - n * n.dot(grad_sigma)) * mag;
                }
                let rho = props.density(fraction[k]);
                (u[k] + dt * force.x / rho, v[k] + dt * force.y / rho)
            })
            .collect();

        let coefficient: Vec<f64> = fraction
            .as_slice()
            .par_iter()
            .map(|&f| dt * props.viscosity(f) / props.density(f))
            .collect();

        let solve = |kind: FieldKind, rhs: ScalarField| {
            ImplicitDiffusion {
                coefficient: &coefficient,
                boundary: kind.boundary(),
                iterations: self.settings.diffusion_iterations,
            }
            .solve(mesh, &rhs)
        };
        let (rhs_u, rhs_v): (Vec<f64>, Vec<f64>) = forced.into_iter().unzip();
        let new_u = solve(FieldKind::VelocityX, ScalarField::from_vec(rhs_u));
        let new_v = solve(FieldKind::VelocityY, ScalarField::from_vec(rhs_v));

        let fields = self.state.fields_mut();
        fields.replace(FieldKind::VelocityX, new_u);
        fields.replace(FieldKind::VelocityY, new_v);
    }

    fn project(&mut self, props: &PhysicalProperties, dt: f64) {
        let mesh = self.state.mesh();
        let fraction = self.state.field(FieldKind::Fraction);
        let u = self.state.field(FieldKind::VelocityX);
        let v = self.state.field(FieldKind::VelocityY);
        let ubc = FieldKind::VelocityX.boundary();
        let vbc = FieldKind::VelocityY.boundary();
        let pbc = FieldKind::Pressure.boundary();

        // ∇²p = rho/dt ∇·u*
        let rhs: Vec<f64> = (0..mesh.len())
            .into_par_iter()
            .map(|k| {
                let id = mesh.cell(k);
                let h = mesh.cell_size(k);
                let div = (mesh.sample(u, id, 1, 0, ubc) - mesh.sample(u, id, -1, 0, ubc)
                    + mesh.sample(v, id, 0, 1, vbc)
                    - mesh.sample(v, id, 0, -1, vbc))
                    / (2.0 * h);
                props.density(fraction[k]) / dt * div
            })
            .collect();

        let mut p = self.state.field(FieldKind::Pressure).clone();
        for _ in 0..self.settings.projection_iterations {
            let next = (0..mesh.len())
                .into_par_iter()
                .map(|k| {
                    let id = mesh.cell(k);
                    let h = mesh.cell_size(k);
                    let sum = mesh.sample(&p, id, 1, 0, pbc)
                        + mesh.sample(&p, id, -1, 0, pbc)
                        + mesh.sample(&p, id, 0, 1, pbc)
                        + mesh.sample(&p, id, 0, -1, pbc);
                    0.25 * (sum - h * h * rhs[k])
                })
                .collect();
            p = ScalarField::from_vec(next);
        }

        let corrected: Vec<(f64, f64)> = (0..mesh.len())
            .into_par_iter()
            .map(|k| {
                let grad_p = gradient(mesh, &p, k, pbc);
                let scale = dt / props.density(fraction[k]);
                (u[k] - scale * grad_p.x, v[k] - scale * grad_p.y)
            })
            .collect();
        let (new_u, new_v): (Vec<f64>, Vec<f64>) = corrected.into_iter().unzip();

        let fields = self.state.fields_mut();
        fields.replace(FieldKind::VelocityX, ScalarField::from_vec(new_u));
        fields.replace(FieldKind::VelocityY, ScalarField::from_vec(new_v));
        fields.replace(FieldKind::Pressure, p);
    }
}

impl Engine for StokesClsvofEngine {
    fn name(&self) -> &str {
        "stokes-clsvof"
    }

    fn state(&self) -> &FlowState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FlowState {
        &mut self.state
    }

    fn advance(&mut self, props: &PhysicalProperties, dt_limit: f64) -> PhysicsResult<f64> {
        let dt = self.timestep.compute(&self.state, props, dt_limit)?;

        let departures = departure_points(
            self.state.mesh(),
            self.state.field(FieldKind::VelocityX),
            self.state.field(FieldKind::VelocityY),
            dt,
        );
        self.transport_interface(&departures);
        self.transport_surfactant(props, dt, &departures);

        self.curvature_from_distance()?;
        self.momentum(props, dt);
        self.project(props, dt);

        log::trace!("{}: dt = {:.4e}, 单元数 {}", self.name(), dt, self.state.n_cells());
        Ok(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializer::FieldInitializer;

    fn small_params() -> ParameterSet {
        let mut config = SimulationConfig::default();
        config.domain.size = 4.0;
        config.adapt.min_level = 2;
        config.adapt.max_level = 5;
        ParameterSet::new(config, 1.0).unwrap()
    }

    fn engine() -> (StokesClsvofEngine, PhysicalProperties) {
        let params = small_params();
        let mut engine = StokesClsvofEngine::new(&params).unwrap();
        FieldInitializer::new(&params).apply(engine.state_mut());
        (engine, params.properties())
    }

    #[test]
    fn test_construction() {
        let (engine, _) = engine();
        assert_eq!(engine.state().n_cells(), 1024);
        assert_eq!(engine.name(), "stokes-clsvof");
    }

    #[test]
    fn test_advance_respects_limit() {
        let (mut engine, props) = engine();
        let dt = engine.advance(&props, 1e-4).unwrap();
        assert!(dt <= 1e-4);
        assert!(dt > 0.0);
    }

    #[test]
    fn test_advance_stays_finite_and_produces_surfactant() {
        let (mut engine, props) = engine();
        for _ in 0..5 {
            engine.advance(&props, 1.0).unwrap();
        }
        let state = engine.state();
        for (kind, field) in state.fields().iter() {
            assert!(field.all_finite(), "{kind} 含非有限值");
        }
        assert!(state.field(FieldKind::Concentration).max_abs() > 0.0);
    }

    #[test]
    fn test_symmetric_droplet_keeps_centroid() {
        let (mut engine, props) = engine();
        for _ in 0..5 {
            engine.advance(&props, 1.0).unwrap();
        }
        let state = engine.state();
        let f = state.field(FieldKind::Fraction);
        let (mut m, mut mx, mut my) = (0.0, 0.0, 0.0);
        for k in 0..state.n_cells() {
            let w = f[k].clamp(0.0, 1.0) * state.mesh().cell_area(k);
            let c = state.mesh().center(k);
            m += w;
            mx += w * c.x;
            my += w * c.y;
        }
        assert!(m > 0.0);
        assert!((mx / m).abs() < 1e-8);
        assert!((my / m).abs() < 1e-8);
    }
}
