// crates/dm_workflow/src/collective.rs

//! 写者本地操作的集合收尾
//!
//! 日志、快照和状态行只在写者上执行。写者失败时若直接 `?` 返回，
//! 参与者会停在下一次集合通信上。[`settle`] 在每个这样的操作之后
//! 交换一次成败标志，所有工作者在同一点一起失败：
//!
//! ```text
//! 写者:    write ─> Err(Io) ──┐
//!                             ├─ all_ok ─> 写者返回 Io, 参与者返回 PeerFailure
//! 参与者:  (跳过) ─> Ok ──────┘
//! ```

use dm_runtime::Communicator;

use crate::error::{WorkflowError, WorkflowResult};

/// 汇总本地结果，任一工作者失败则全部失败
///
/// 失败的工作者返回自己的错误，其余工作者返回 [`WorkflowError::PeerFailure`]。
pub fn settle<T>(comm: &dyn Communicator, local: WorkflowResult<T>) -> WorkflowResult<T> {
    let failed = comm.all_ok(local.is_ok())?;
    match local {
        Err(err) => Err(err),
        Ok(_) if !failed.is_empty() => Err(WorkflowError::PeerFailure { ranks: failed }),
        Ok(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_runtime::{LocalCommunicator, TeamCommunicator};
    use std::thread;

    #[test]
    fn test_settle_local() {
        let comm = LocalCommunicator::new();
        assert_eq!(settle(&comm, Ok(3)).unwrap(), 3);
        let err = settle::<()>(&comm, Err(WorkflowError::InvalidState("x".into())));
        assert!(matches!(err, Err(WorkflowError::InvalidState(_))));
    }

    #[test]
    fn test_settle_propagates_writer_failure() {
        let team = TeamCommunicator::team(2).unwrap();
        let handles: Vec<_> = team
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    let local = if comm.is_writer() {
                        Err(WorkflowError::InvalidState("disk full".into()))
                    } else {
                        Ok(())
                    };
                    let first = settle(&comm, local);
                    // 失败之后集合通信仍然对齐
                    let second = settle(&comm, Ok(comm.rank()));
                    (comm.rank(), first, second)
                })
            })
            .collect();

        for h in handles {
            let (rank, first, second) = h.join().unwrap();
            match (rank, first) {
                (0, Err(WorkflowError::InvalidState(_))) => {}
                (1, Err(WorkflowError::PeerFailure { ranks })) => assert_eq!(ranks, vec![0]),
                (_, other) => panic!("unexpected: {other:?}"),
            }
            assert_eq!(second.unwrap(), rank);
        }
    }
}
