// apps/dm_cli/src/common.rs

//! 各命令共享的选项：配置文件、日志级别、线程数

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use dm_config::SimulationConfig;
use dm_foundation::DmError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// 公共选项
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// 配置文件路径 (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// 工作线程数（默认由 rayon 决定）
    #[arg(long)]
    pub threads: Option<usize>,
}

impl CommonArgs {
    /// 初始化日志与线程池
    pub fn init(&self) -> Result<()> {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(parse_level(&self.log_level))
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;

        if let Some(n) = self.threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build_global()
                .context("初始化线程池失败")?;
        }
        Ok(())
    }

    /// 读取配置文件，未指定时使用默认配置
    pub fn load_config(&self) -> Result<SimulationConfig> {
        match &self.config {
            Some(path) => {
                let config = SimulationConfig::from_file(path)
                    .map_err(DmError::from)
                    .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
                tracing::info!("配置文件: {}", path.display());
                Ok(config)
            }
            None => Ok(SimulationConfig::default()),
        }
    }
}

/// 错误链中第一个 [`DmError`] 决定退出码，没有时为 1
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<DmError>())
        .map_or(1, DmError::exit_code)
}

/// 命令结果转为进程退出码，错误写到标准错误
pub fn finish(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// 解析日志级别，无法识别时使用 INFO
pub fn parse_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("nonsense"), Level::INFO);
    }

    #[test]
    fn test_load_default_config() {
        let args = CommonArgs {
            config: None,
            log_level: "info".into(),
            threads: None,
        };
        assert_eq!(args.load_config().unwrap(), SimulationConfig::default());
    }

    #[test]
    fn test_load_missing_config_fails() {
        let args = CommonArgs {
            config: Some(PathBuf::from("/nonexistent/dropmove.json")),
            log_level: "info".into(),
            threads: None,
        };
        let err = args.load_config().unwrap_err();
        assert_eq!(exit_code(&err), 4);
    }

    #[test]
    fn test_exit_code_follows_context_chain() {
        let err = Err::<(), _>(DmError::numerical("ke"))
            .context("模拟失败")
            .unwrap_err();
        assert_eq!(exit_code(&err), 3);
        assert_eq!(exit_code(&anyhow::anyhow!("plain")), 1);
    }
}
