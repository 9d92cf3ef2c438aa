// crates/dm_workflow/src/error.rs

//! 工作流错误类型
//!
//! 下层 crate 的错误经 `#[from]` 汇入 [`WorkflowError`]，
//! 稳定性破坏与退化质量有各自独立的变体。

use dm_config::ConfigError;
use dm_foundation::DmError;
use dm_io::IoError;
use dm_physics::PhysicsError;
use dm_runtime::RuntimeError;
use thiserror::Error;

/// 工作流结果类型
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// 工作流错误
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// 配置错误
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// 引擎或物理层错误
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// 文件或输出错误
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// 集合通信错误（含判定不一致）
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// 稳定性不变量被破坏
    #[error("Stability violation at step {step}: kinetic energy {kinetic_energy:e}, displacement {displacement:e}")]
    StabilityViolation {
        /// 步号
        step: u64,
        /// 全局动能
        kinetic_energy: f64,
        /// 质心位移
        displacement: f64,
    },

    /// 体积分数总量为零，质心无定义
    #[error("Degenerate configuration at step {step}: total volume fraction is zero")]
    DegenerateConfiguration {
        /// 步号
        step: u64,
    },

    /// 临界 Pe 搜索没有找到迁移区间
    #[error("No moving regime found within [{min}, {max}]")]
    NoMovingRegime {
        /// 下限
        min: f64,
        /// 上限
        max: f64,
    },

    /// 其他工作者的本地操作失败
    #[error("Peer worker(s) {ranks:?} failed")]
    PeerFailure {
        /// 失败的 rank
        ranks: Vec<usize>,
    },

    /// 无效状态
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<WorkflowError> for DmError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Config(e) => e.into(),
            WorkflowError::Physics(e) => e.into(),
            WorkflowError::Io(e) => e.into(),
            WorkflowError::Runtime(e) => e.into(),
            other @ (WorkflowError::StabilityViolation { .. }
            | WorkflowError::DegenerateConfiguration { .. }) => DmError::numerical(other.to_string()),
            other => DmError::internal(other.to_string()),
        }
    }
}
