// apps/dm_cli/src/commands/drop_move.rs

//! 单次迁移模拟
//!
//! 唯一的位置参数是 Péclet 数；其余物理与离散参数全部来自配置。
//! 运行结束时在标准输出打印一行 `STATUS MOVED` 或 `STATUS NOT_MOVED`。

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dm_config::{parse_peclet, ParameterSet, SimulationConfig};
use dm_foundation::DmError;
use dm_physics::StokesClsvofEngine;
use dm_runtime::LocalCommunicator;
use dm_workflow::{RunSummary, Simulation, SimulationContext, StatusSink, WorkflowResult};
use tracing::info;

use crate::common::CommonArgs;

/// 表面活性剂液滴迁移模拟
#[derive(Parser, Debug)]
#[command(name = "drop_move")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Simulate a surfactant-laden droplet and report whether it migrates", long_about = None)]
pub struct DropMoveArgs {
    /// Péclet 数（必须为正的有限值）
    pub peclet: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// 用参考引擎运行一次模拟
pub fn run_reference(
    config: SimulationConfig,
    peclet: f64,
    status: StatusSink,
) -> WorkflowResult<RunSummary> {
    let params = ParameterSet::new(config, peclet)?;
    let engine = StokesClsvofEngine::new(&params)?;
    let ctx = SimulationContext::new(
        params,
        Box::new(engine),
        Arc::new(LocalCommunicator::new()),
        status,
    )?;
    Simulation::new(ctx).run()
}

/// 执行
pub fn execute(args: DropMoveArgs) -> Result<()> {
    // 参数错误必须在任何工作之前报告
    let peclet = parse_peclet(args.peclet.as_deref())
        .map_err(DmError::from)
        .context("无效的 Péclet 数")?;
    let config = args.common.load_config()?;
    config
        .validate()
        .map_err(DmError::from)
        .context("配置验证失败")?;

    info!("=== DropMove 模拟启动: Pe = {} ===", peclet);
    let summary = run_reference(config, peclet, Box::new(std::io::stdout()))
        .map_err(DmError::from)
        .with_context(|| format!("模拟失败 (Pe = {peclet})"))?;
    info!(
        "判定 {}，共 {} 步，t = {:.4}",
        summary.verdict, summary.completed_steps, summary.final_time
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = DropMoveArgs::try_parse_from(["drop_move", "2.5", "--threads", "2"]).unwrap();
        assert_eq!(args.peclet.as_deref(), Some("2.5"));
        assert_eq!(args.common.threads, Some(2));
        assert_eq!(args.common.log_level, "info");
    }

    #[test]
    fn test_missing_peclet_rejected_before_work() {
        let args = DropMoveArgs::try_parse_from(["drop_move"]).unwrap();
        let err = execute(args).unwrap_err();
        assert_eq!(crate::exit_code(&err), 2);
    }

    #[test]
    fn test_negative_peclet_rejected() {
        let args = DropMoveArgs::try_parse_from(["drop_move", "--", "-1"]).unwrap();
        let err = execute(args).unwrap_err();
        assert_eq!(crate::exit_code(&err), 2);
    }
}
