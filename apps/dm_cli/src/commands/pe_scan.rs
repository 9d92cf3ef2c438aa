// apps/dm_cli/src/commands/pe_scan.rs

//! 临界 Péclet 数扫描
//!
//! 在进程内逐次运行参考模拟；每次运行的日志与快照照常写出并被下一次覆盖。

use anyhow::{Context, Result};
use clap::Parser;
use dm_foundation::DmError;
use dm_workflow::{CriticalPecletSearch, SearchOutcome};

use crate::commands::drop_move::run_reference;
use crate::common::CommonArgs;

/// 临界 Pe 搜索
#[derive(Parser, Debug)]
#[command(name = "pe_scan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search for the smallest Péclet number at which the droplet migrates", long_about = None)]
pub struct ScanArgs {
    /// 起始 Pe
    #[arg(default_value = "1.0")]
    pub pe_start: f64,

    /// 初始步长
    #[arg(default_value = "0.5")]
    pub step0: f64,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// 运行搜索
pub fn scan(args: &ScanArgs) -> Result<SearchOutcome> {
    let config = args.common.load_config()?;
    config
        .validate()
        .map_err(DmError::from)
        .context("配置验证失败")?;

    let search = CriticalPecletSearch::new(args.pe_start, args.step0);
    let outcome = search.run(|pe| {
        run_reference(config.clone(), pe, Box::new(std::io::sink())).map(|s| s.verdict)
    });
    let outcome = outcome.map_err(DmError::from)?;
    Ok(outcome)
}

/// 执行
pub fn execute(args: ScanArgs) -> Result<()> {
    let outcome = scan(&args).context("临界 Pe 搜索失败")?;
    for e in &outcome.evaluations {
        println!("Pe={:.6} -> {}", e.peclet, if e.moved { "MOVED" } else { "not moved" });
    }
    println!("Critical Pe (first moving, 2 dp): {:.2}", outcome.critical_peclet);
    Ok(())
}
