//! Usage: Best-effort cleanup hooks for app lifecycle events (exit/restart).

use crate::app::app_state::ConsoleRegistryState;
use crate::shared::mutex_ext::MutexExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tauri::Manager;

static CLEANUP_STARTED: AtomicBool = AtomicBool::new(false);

pub(crate) async fn cleanup_before_exit(app: &tauri::AppHandle) {
    if CLEANUP_STARTED.swap(true, Ordering::SeqCst) {
        return;
    }

    let consoles = {
        let state = app.state::<ConsoleRegistryState>();
        let registry = state.0.lock_or_recover();
        registry.all()
    };

    let mut killed_any = false;
    for console in consoles {
        // The exit path skips the confirmation dialog: the user already
        // chose to quit the launcher.
        if console.kill_on_close() && console.has_process() {
            let outcome = console.kill_tracked();
            if outcome.terminated {
                killed_any = true;
                tracing::info!(console = console.label(), "退出清理：已请求结束游戏进程");
            }
        }
    }

    if killed_any {
        // Short grace so the termination request reaches the OS before the
        // launcher process goes away.
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
