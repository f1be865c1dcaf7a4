//! Usage: Handle abstraction over the spawned game process.
//!
//! The console supervisor never touches `std::process` directly: it polls
//! an explicit `ExitPoll` instead of relying on a thrown "still running"
//! signal, and termination is fire-and-forget (no wait for OS-level exit;
//! completion is confirmed by a later `poll_exit`).

use std::process::Child;

/// Result of a non-blocking exit query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPoll {
    Running,
    /// `None` exit code means the process was terminated by a signal.
    Exited(Option<i32>),
}

pub trait ProcessHandle: Send {
    fn pid(&self) -> u32;

    /// Non-blocking, best-effort. A failed underlying query is reported as
    /// `Running`, never as an error.
    fn poll_exit(&mut self) -> ExitPoll;

    /// Request termination and return immediately.
    fn terminate(&mut self);
}

pub type BoxedProcess = Box<dyn ProcessHandle>;

/// Production handle over a spawned `std::process::Child`.
pub struct ChildProcess {
    child: Child,
}

impl ChildProcess {
    pub fn new(child: Child) -> Self {
        Self { child }
    }
}

impl ProcessHandle for ChildProcess {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn poll_exit(&mut self) -> ExitPoll {
        match self.child.try_wait() {
            Ok(Some(status)) => ExitPoll::Exited(status.code()),
            Ok(None) => ExitPoll::Running,
            Err(err) => {
                tracing::debug!(pid = self.child.id(), "查询游戏进程退出状态失败: {err}");
                ExitPoll::Running
            }
        }
    }

    fn terminate(&mut self) {
        if let Err(err) = self.child.kill() {
            // Already-exited children land here; nothing to surface.
            tracing::debug!(pid = self.child.id(), "结束游戏进程失败: {err}");
        }
    }
}
