use super::*;
use crate::domain::process::{ExitPoll, ProcessHandle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const CONFIG: ConsoleConfig = ConsoleConfig {
    num_lines: 1000,
    colors_enabled: true,
};

/// Scripted process handle: exit state is externally controlled, terminate
/// calls are counted.
struct FakeProcess {
    exit: Arc<Mutex<ExitPoll>>,
    terminations: Arc<AtomicUsize>,
    exit_on_terminate: Option<ExitPoll>,
}

struct FakeControls {
    exit: Arc<Mutex<ExitPoll>>,
    terminations: Arc<AtomicUsize>,
}

impl FakeControls {
    fn set_exited(&self, code: Option<i32>) {
        *self.exit.lock().unwrap() = ExitPoll::Exited(code);
    }

    fn termination_count(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

fn fake_process() -> (Box<FakeProcess>, FakeControls) {
    fake_process_with_terminate_behavior(None)
}

/// `exit_on_terminate` models an OS that reaps fast enough for the
/// detach-time exit read to observe the kill.
fn fake_process_with_terminate_behavior(
    exit_on_terminate: Option<ExitPoll>,
) -> (Box<FakeProcess>, FakeControls) {
    let exit = Arc::new(Mutex::new(ExitPoll::Running));
    let terminations = Arc::new(AtomicUsize::new(0));
    let process = Box::new(FakeProcess {
        exit: exit.clone(),
        terminations: terminations.clone(),
        exit_on_terminate,
    });
    (process, FakeControls { exit, terminations })
}

impl ProcessHandle for FakeProcess {
    fn pid(&self) -> u32 {
        4242
    }

    fn poll_exit(&mut self) -> ExitPoll {
        *self.exit.lock().unwrap()
    }

    fn terminate(&mut self) {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        if let Some(state) = self.exit_on_terminate {
            *self.exit.lock().unwrap() = state;
        }
    }
}

#[test]
fn has_process_reflects_most_recent_attach() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    assert!(!supervisor.has_process());

    let (p1, _c1) = fake_process();
    supervisor.attach(Some(p1));
    assert!(supervisor.has_process());

    let (p2, _c2) = fake_process();
    supervisor.attach(Some(p2));
    assert!(supervisor.has_process());

    supervisor.attach(None);
    assert!(!supervisor.has_process());
}

#[test]
fn first_attach_logs_only_the_attachment() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, _c1) = fake_process();
    let lines = supervisor.attach(Some(p1));
    assert_eq!(lines, vec!["已附加到游戏进程".to_string()]);
}

#[test]
fn replacing_an_exited_process_logs_exit_then_attachment() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, c1) = fake_process();
    supervisor.attach(Some(p1));
    c1.set_exited(Some(3));

    let (p2, _c2) = fake_process();
    let lines = supervisor.attach(Some(p2));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "游戏进程已退出（退出码 3）");
    assert_eq!(lines[1], "已附加到游戏进程");
}

#[test]
fn replacing_a_still_running_process_swallows_the_exit_read() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, _c1) = fake_process();
    supervisor.attach(Some(p1));

    let (p2, _c2) = fake_process();
    let lines = supervisor.attach(Some(p2));
    assert_eq!(lines, vec!["已附加到游戏进程".to_string()]);
}

#[test]
fn detaching_a_running_process_is_silent() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, _c1) = fake_process();
    supervisor.attach(Some(p1));

    let lines = supervisor.attach(None);
    assert!(lines.is_empty());
    assert!(!supervisor.has_process());
}

#[test]
fn signal_termination_is_reported_without_a_code() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, c1) = fake_process();
    supervisor.attach(Some(p1));
    c1.set_exited(None);

    let lines = supervisor.attach(None);
    assert_eq!(lines, vec!["游戏进程已退出（被信号终止）".to_string()]);
}

#[test]
fn kill_with_no_tracked_process_is_a_no_op() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let outcome = supervisor.kill_tracked();
    assert!(!outcome.terminated);
    assert!(outcome.lines.is_empty());
    assert!(!supervisor.has_process());
}

#[test]
fn kill_terminates_exactly_once_and_detaches() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, c1) = fake_process();
    supervisor.attach(Some(p1));

    let outcome = supervisor.kill_tracked();
    assert!(outcome.terminated);
    assert_eq!(c1.termination_count(), 1);
    assert!(!supervisor.has_process());
}

#[test]
fn kill_logs_the_exit_code_when_the_os_reaps_immediately() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, c1) =
        fake_process_with_terminate_behavior(Some(ExitPoll::Exited(Some(137))));
    supervisor.attach(Some(p1));

    let outcome = supervisor.kill_tracked();
    assert!(outcome.terminated);
    assert_eq!(c1.termination_count(), 1);
    assert_eq!(outcome.lines, vec!["游戏进程已退出（退出码 137）".to_string()]);
}

#[test]
fn kill_stays_silent_when_the_exit_code_is_not_yet_readable() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, _c1) = fake_process();
    supervisor.attach(Some(p1));

    let outcome = supervisor.kill_tracked();
    assert!(outcome.terminated);
    assert!(outcome.lines.is_empty());
}

#[test]
fn visual_state_derivation_table() {
    let mut supervisor = Supervisor::new(CONFIG, false);

    // no process, no tray
    let state = supervisor.visual_state();
    assert_eq!(state.icon, IconVariant::Idle);
    assert!(!state.kill_enabled);
    assert_eq!(state.secondary, SecondaryAction::Close);

    // no process, tray present
    supervisor.set_tray_present(true);
    assert_eq!(supervisor.visual_state().secondary, SecondaryAction::Close);

    // process, tray present
    let (p1, _c1) = fake_process();
    supervisor.attach(Some(p1));
    let state = supervisor.visual_state();
    assert_eq!(state.icon, IconVariant::Running);
    assert!(state.kill_enabled);
    assert_eq!(state.secondary, SecondaryAction::Hide);

    // process, no tray
    supervisor.set_tray_present(false);
    assert_eq!(supervisor.visual_state().secondary, SecondaryAction::Close);
}

#[test]
fn monitor_reports_natural_exit_and_detaches() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, c1) = fake_process();
    supervisor.attach(Some(p1));
    let generation = supervisor.generation();

    assert!(matches!(
        supervisor.poll_natural_exit(generation),
        MonitorTick::StillRunning
    ));

    c1.set_exited(Some(0));
    match supervisor.poll_natural_exit(generation) {
        MonitorTick::Exited(lines) => {
            assert_eq!(lines, vec!["游戏进程已退出（退出码 0）".to_string()]);
        }
        _ => panic!("expected Exited"),
    }
    assert!(!supervisor.has_process());
}

#[test]
fn monitor_stops_when_its_process_is_replaced() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, _c1) = fake_process();
    supervisor.attach(Some(p1));
    let generation = supervisor.generation();

    let (p2, _c2) = fake_process();
    supervisor.attach(Some(p2));

    assert!(matches!(
        supervisor.poll_natural_exit(generation),
        MonitorTick::Superseded
    ));
}

#[test]
fn monitor_stops_after_detach() {
    let mut supervisor = Supervisor::new(CONFIG, false);
    let (p1, _c1) = fake_process();
    supervisor.attach(Some(p1));
    let generation = supervisor.generation();
    supervisor.attach(None);

    assert!(matches!(
        supervisor.poll_natural_exit(generation),
        MonitorTick::Superseded
    ));
}

#[test]
fn console_handle_guards_state_behind_its_lock() {
    let handle = ConsoleHandle::new("console-1".to_string(), CONFIG, true);
    assert!(handle.kill_on_close());
    assert!(!handle.has_process());

    let (p1, c1) = fake_process();
    let outcome = handle.attach(Some(p1));
    assert_eq!(outcome.lines, vec!["已附加到游戏进程".to_string()]);
    assert!(handle.has_process());

    let kill = handle.kill_tracked();
    assert!(kill.terminated);
    assert_eq!(c1.termination_count(), 1);
    assert!(!handle.has_process());

    // Idempotent after detach.
    assert!(!handle.kill_tracked().terminated);
}
