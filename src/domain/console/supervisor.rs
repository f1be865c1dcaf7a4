//! Usage: Supervision state machine for one console window.
//!
//! `Supervisor` holds the tracked process and the flags derived state is
//! computed from. `ConsoleHandle` wraps it in the per-console mutex; every
//! state transition happens under that single lock. The blocking kill
//! confirmation runs in the command layer, never under the lock, so attach
//! notifications from launcher threads are never blocked on the user.

use crate::domain::process::{BoxedProcess, ExitPoll};
use crate::shared::mutex_ext::MutexExt;
use std::sync::Mutex;

/// Console display options, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleConfig {
    pub num_lines: u32,
    pub colors_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconVariant {
    Running,
    Idle,
}

/// Label shown on the secondary window button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecondaryAction {
    Hide,
    Close,
}

/// Everything the window/tray surface derives from supervision state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct VisualState {
    pub icon: IconVariant,
    pub kill_enabled: bool,
    pub secondary: SecondaryAction,
}

pub struct AttachOutcome {
    pub lines: Vec<String>,
    /// Generation of the newly attached process, handed to its monitor.
    pub generation: u64,
}

pub struct KillOutcome {
    pub terminated: bool,
    pub lines: Vec<String>,
}

/// One observation by a background exit monitor.
pub enum MonitorTick {
    StillRunning,
    /// The tracked process exited on its own and was detached; the status
    /// lines report the exit code.
    Exited(Vec<String>),
    /// The monitored process is no longer the tracked one; the monitor
    /// should stop.
    Superseded,
}

const LINE_ATTACHED: &str = "已附加到游戏进程";

fn exit_line(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("游戏进程已退出（退出码 {code}）"),
        None => "游戏进程已退出（被信号终止）".to_string(),
    }
}

pub struct Supervisor {
    config: ConsoleConfig,
    tracked: Option<BoxedProcess>,
    tray_present: bool,
    kill_on_close: bool,
    // Bumped on every attach; lets a monitor detect replacement.
    generation: u64,
}

impl Supervisor {
    pub fn new(config: ConsoleConfig, kill_on_close: bool) -> Self {
        Self {
            config,
            tracked: None,
            tray_present: false,
            kill_on_close,
            generation: 0,
        }
    }

    pub fn config(&self) -> ConsoleConfig {
        self.config
    }

    pub fn has_process(&self) -> bool {
        self.tracked.is_some()
    }

    pub fn tray_present(&self) -> bool {
        self.tray_present
    }

    pub fn set_tray_present(&mut self, present: bool) {
        self.tray_present = present;
    }

    pub fn kill_on_close(&self) -> bool {
        self.kill_on_close
    }

    pub fn set_kill_on_close(&mut self, enabled: bool) {
        self.kill_on_close = enabled;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the tracked process (or detach with `None`).
    ///
    /// The previous process, if any, gets a best-effort exit-code read: an
    /// exit line when it already exited, silence when it is still running.
    /// A newly attached process is announced after that, so replacing P1
    /// with P2 yields exactly "P1 exit report (if readable)" then
    /// "attached".
    pub fn attach(&mut self, process: Option<BoxedProcess>) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(previous) = self.tracked.as_mut() {
            if let ExitPoll::Exited(code) = previous.poll_exit() {
                lines.push(exit_line(code));
            }
        }

        if process.is_some() {
            lines.push(LINE_ATTACHED.to_string());
        }

        self.tracked = process;
        self.generation = self.generation.wrapping_add(1);
        lines
    }

    /// Terminate the tracked process (exactly one termination request) and
    /// detach. A no-op when nothing is tracked.
    pub fn kill_tracked(&mut self) -> KillOutcome {
        match self.tracked.as_mut() {
            Some(process) => {
                process.terminate();
                let lines = self.attach(None);
                KillOutcome {
                    terminated: true,
                    lines,
                }
            }
            None => KillOutcome {
                terminated: false,
                lines: Vec::new(),
            },
        }
    }

    /// One monitor observation for the process attached at `generation`.
    pub fn poll_natural_exit(&mut self, generation: u64) -> MonitorTick {
        if self.generation != generation {
            return MonitorTick::Superseded;
        }

        let Some(process) = self.tracked.as_mut() else {
            return MonitorTick::Superseded;
        };

        match process.poll_exit() {
            ExitPoll::Running => MonitorTick::StillRunning,
            ExitPoll::Exited(_) => MonitorTick::Exited(self.attach(None)),
        }
    }

    pub fn visual_state(&self) -> VisualState {
        let running = self.has_process();
        VisualState {
            icon: if running {
                IconVariant::Running
            } else {
                IconVariant::Idle
            },
            kill_enabled: running,
            secondary: if running && self.tray_present {
                SecondaryAction::Hide
            } else {
                SecondaryAction::Close
            },
        }
    }
}

/// A console window's supervision state behind its per-console lock.
pub struct ConsoleHandle {
    label: String,
    state: Mutex<Supervisor>,
}

impl ConsoleHandle {
    pub fn new(label: String, config: ConsoleConfig, kill_on_close: bool) -> Self {
        Self {
            label,
            state: Mutex::new(Supervisor::new(config, kill_on_close)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> ConsoleConfig {
        self.state.lock_or_recover().config()
    }

    pub fn attach(&self, process: Option<BoxedProcess>) -> AttachOutcome {
        let mut state = self.state.lock_or_recover();
        let lines = state.attach(process);
        AttachOutcome {
            lines,
            generation: state.generation(),
        }
    }

    pub fn has_process(&self) -> bool {
        self.state.lock_or_recover().has_process()
    }

    pub fn kill_tracked(&self) -> KillOutcome {
        self.state.lock_or_recover().kill_tracked()
    }

    pub fn poll_natural_exit(&self, generation: u64) -> MonitorTick {
        self.state.lock_or_recover().poll_natural_exit(generation)
    }

    pub fn visual_state(&self) -> VisualState {
        self.state.lock_or_recover().visual_state()
    }

    pub fn tray_present(&self) -> bool {
        self.state.lock_or_recover().tray_present()
    }

    pub fn set_tray_present(&self, present: bool) {
        self.state.lock_or_recover().set_tray_present(present);
    }

    pub fn kill_on_close(&self) -> bool {
        self.state.lock_or_recover().kill_on_close()
    }

    pub fn set_kill_on_close(&self, enabled: bool) {
        self.state.lock_or_recover().set_kill_on_close(enabled);
    }
}
