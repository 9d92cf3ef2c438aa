// crates/dm_runtime/src/communicator.rs

//! 工作者通信抽象
//!
//! 每一步的全局归约和终止判定都必须经过显式的集合通信完成：
//! 所有工作者以相同顺序调用同一组集合操作，随后得到完全相同的结果。
//! 只有被指定为写者（[`Role::Writer`]）的工作者执行文件与状态输出。
//!
//! # 实现
//!
//! - [`LocalCommunicator`]: 单工作者，自身即写者
//! - [`TeamCommunicator`]: 同进程线程团队，基于屏障同步

use std::sync::{Arc, Barrier};

use dm_foundation::KahanSum;
use parking_lot::Mutex;

use crate::error::{RuntimeError, RuntimeResult};
use crate::reduce::owned_range;

/// 工作者角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// 指定写者：负责日志、状态输出和快照
    Writer,
    /// 参与者：只参与归约，不做 IO
    Participant,
}

impl Role {
    /// 是否为写者
    pub fn is_writer(self) -> bool {
        matches!(self, Role::Writer)
    }
}

/// 集合通信接口
///
/// `all_gather` 是唯一必须实现的集合操作，求和与一致性判定都在其上构建，
/// 合并总是按 rank 顺序进行，因此结果与线程到达顺序无关。
pub trait Communicator: Send + Sync {
    /// 当前工作者编号
    fn rank(&self) -> usize;

    /// 工作者总数
    fn size(&self) -> usize;

    /// 当前工作者的角色
    fn role(&self) -> Role;

    /// 收集所有工作者的本地载荷（按 rank 排列）
    fn all_gather(&self, local: &[f64]) -> RuntimeResult<Vec<Vec<f64>>>;

    /// 是否为写者
    fn is_writer(&self) -> bool {
        self.role().is_writer()
    }

    /// 本工作者负责归约的单元区间
    ///
    /// 每个工作者只对自己的区间求本地和，`all_reduce_sum` 之后各区间恰好计入一次。
    fn owned(&self, n: usize) -> std::ops::Range<usize> {
        owned_range(n, self.rank(), self.size())
    }

    /// 逐分量全局求和
    fn all_reduce_sum(&self, local: &[f64]) -> RuntimeResult<Vec<f64>> {
        let gathered = self.all_gather(local)?;
        let sums = (0..local.len())
            .map(|k| KahanSum::sum_iter(gathered.iter().map(|part| part[k])))
            .collect();
        Ok(sums)
    }

    /// 要求所有工作者持有相同的判定码
    ///
    /// 任何分歧都是错误，调用方不得在分歧状态下继续或停止。
    fn agree(&self, code: u32) -> RuntimeResult<u32> {
        let gathered = self.all_gather(&[f64::from(code)])?;
        let codes: Vec<u32> = gathered.iter().map(|part| part[0] as u32).collect();
        if codes.iter().all(|&c| c == code) {
            Ok(code)
        } else {
            Err(RuntimeError::Disagreement { codes })
        }
    }

    /// 汇总各工作者的本地成败，返回失败的 rank（按 rank 顺序）
    ///
    /// 只在一个工作者上可能失败的操作（写者 IO）之后调用，
    /// 使其余工作者在同一点得知失败，而不是在下一次集合通信处永久等待。
    fn all_ok(&self, ok: bool) -> RuntimeResult<Vec<usize>> {
        let gathered = self.all_gather(&[if ok { 0.0 } else { 1.0 }])?;
        Ok(gathered
            .iter()
            .enumerate()
            .filter(|(_, part)| part[0] != 0.0)
            .map(|(rank, _)| rank)
            .collect())
    }
}

// ============================================================
// 单工作者
// ============================================================

/// 单进程单工作者通信器
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCommunicator;

impl LocalCommunicator {
    /// 创建通信器
    pub fn new() -> Self {
        Self
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn role(&self) -> Role {
        Role::Writer
    }

    fn all_gather(&self, local: &[f64]) -> RuntimeResult<Vec<Vec<f64>>> {
        Ok(vec![local.to_vec()])
    }
}

// ============================================================
// 线程团队
// ============================================================

struct TeamShared {
    size: usize,
    writer: usize,
    barrier: Barrier,
    slots: Mutex<Vec<Vec<f64>>>,
}

/// 线程团队通信器
///
/// 由 [`TeamCommunicator::team`] 一次性创建全部成员，每个成员移入各自线程。
#[derive(Clone)]
pub struct TeamCommunicator {
    rank: usize,
    shared: Arc<TeamShared>,
}

impl std::fmt::Debug for TeamCommunicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamCommunicator")
            .field("rank", &self.rank)
            .field("size", &self.shared.size)
            .field("writer", &self.shared.writer)
            .finish()
    }
}

impl TeamCommunicator {
    /// 创建 `size` 个成员的团队，rank 0 为写者
    pub fn team(size: usize) -> RuntimeResult<Vec<TeamCommunicator>> {
        Self::team_with_writer(size, 0)
    }

    /// 创建团队并指定写者
    pub fn team_with_writer(size: usize, writer: usize) -> RuntimeResult<Vec<TeamCommunicator>> {
        if size == 0 {
            return Err(RuntimeError::InvalidTeam("团队至少需要一个成员".into()));
        }
        if writer >= size {
            return Err(RuntimeError::InvalidTeam(format!(
                "写者 rank {writer} 超出团队大小 {size}"
            )));
        }

        let shared = Arc::new(TeamShared {
            size,
            writer,
            barrier: Barrier::new(size),
            slots: Mutex::new(vec![Vec::new(); size]),
        });

        Ok((0..size)
            .map(|rank| TeamCommunicator {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect())
    }
}

impl Communicator for TeamCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn role(&self) -> Role {
        if self.rank == self.shared.writer {
            Role::Writer
        } else {
            Role::Participant
        }
    }

    fn all_gather(&self, local: &[f64]) -> RuntimeResult<Vec<Vec<f64>>> {
        self.shared.slots.lock()[self.rank] = local.to_vec();
        self.shared.barrier.wait();

        let gathered = self.shared.slots.lock().clone();

        // 所有成员读取完成后才允许下一轮写入
        self.shared.barrier.wait();

        for (rank, part) in gathered.iter().enumerate() {
            if part.len() != local.len() {
                return Err(RuntimeError::PayloadMismatch {
                    rank,
                    expected: local.len(),
                    actual: part.len(),
                });
            }
        }
        Ok(gathered)
    }
}
