//! Usage: Console window lifecycle (open/close/hide, status lines, visual refresh).
//!
//! This is the Tauri glue around `domain::console`: it owns window and tray
//! side effects, keeps the single-active-console policy, and marshals every
//! visual refresh onto the main thread. State transitions themselves happen
//! inside the console's own lock in the domain layer.

use crate::app::app_state::ConsoleRegistryState;
use crate::domain::console::{ConsoleConfig, ConsoleHandle, VisualState};
use crate::domain::process::BoxedProcess;
use crate::infra::settings::AppSettings;
use crate::shared::mutex_ext::MutexExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tauri::{Emitter, Manager};

pub const MAIN_WINDOW_LABEL: &str = "main";
pub const CONSOLE_LABEL_PREFIX: &str = "console-";

pub const CONSOLE_LINE_EVENT: &str = "console:line";
pub const CONSOLE_STATE_EVENT: &str = "console:state";

// Status lines are printed in blue when color is enabled, to stand apart
// from plain game output.
const STATUS_LINE_COLOR: &str = "#2563eb";

static NEXT_CONSOLE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, serde::Serialize)]
struct LinePayload {
    text: String,
    color: Option<String>,
}

/// Open a new console window: register it, create its tray (best-effort)
/// and ask every previously-open console to close.
pub fn open_console(
    app: &tauri::AppHandle,
    settings: &AppSettings,
) -> Result<Arc<ConsoleHandle>, String> {
    let config = ConsoleConfig {
        num_lines: settings.console_log_lines,
        colors_enabled: settings.console_colors,
    };
    let label = format!(
        "{}{}",
        CONSOLE_LABEL_PREFIX,
        NEXT_CONSOLE_ID.fetch_add(1, Ordering::SeqCst)
    );
    let console = Arc::new(ConsoleHandle::new(
        label.clone(),
        config,
        settings.kill_on_close,
    ));

    let priors = {
        let state = app.state::<ConsoleRegistryState>();
        let mut registry = state.0.lock_or_recover();
        registry.register(console.clone())
    };

    if let Err(err) =
        tauri::WebviewWindowBuilder::new(app, &label, tauri::WebviewUrl::App("index.html".into()))
            .title("游戏控制台")
            .inner_size(760.0, 520.0)
            .build()
    {
        // Roll the registration back; a console without a window must
        // not stay findable.
        let state = app.state::<ConsoleRegistryState>();
        state.0.lock_or_recover().remove(&label);
        return Err(format!("创建控制台窗口失败: {err}"));
    }

    #[cfg(desktop)]
    if settings.tray_enabled {
        match crate::app::tray::setup_console_tray(app, &label) {
            Ok(()) => console.set_tray_present(true),
            Err(err) => {
                tracing::warn!(console = %label, "系统托盘不可用，最小化按钮退化为关闭: {err}");
            }
        }
    }

    // Single-active-console policy: every prior console receives a close
    // request before this constructor returns. They leave the registry
    // once their window is actually destroyed.
    dispatch_prior_closes(
        priors,
        |prior| {
            app.get_webview_window(prior.label())
                .map(|prior_window| {
                    let _ = prior_window.close();
                })
                .is_some()
        },
        |label| {
            let state = app.state::<ConsoleRegistryState>();
            state.0.lock_or_recover().remove(label);
        },
    );

    schedule_refresh(app, &console);
    Ok(console)
}

/// Ask each prior console to close through its normal close path.
/// `request_close` returns whether the prior still had a window; a
/// windowless prior is dropped from the registry at once instead.
fn dispatch_prior_closes(
    priors: Vec<Arc<ConsoleHandle>>,
    mut request_close: impl FnMut(&ConsoleHandle) -> bool,
    mut remove_stale: impl FnMut(&str),
) {
    for prior in priors {
        if !request_close(&prior) {
            remove_stale(prior.label());
        }
    }
}

pub fn find_console(app: &tauri::AppHandle, label: &str) -> Option<Arc<ConsoleHandle>> {
    let state = app.state::<ConsoleRegistryState>();
    let registry = state.0.lock_or_recover();
    registry.find(label)
}

/// The console the tray and main window act on: the most recently opened.
pub fn active_console(app: &tauri::AppHandle) -> Option<Arc<ConsoleHandle>> {
    let state = app.state::<ConsoleRegistryState>();
    let registry = state.0.lock_or_recover();
    registry.latest()
}

/// Attach a process (or detach with `None`) and render the outcome:
/// status lines to the console, refresh scheduled on the main thread.
/// Returns the attach generation for the caller's exit monitor.
pub fn attach_and_render(
    app: &tauri::AppHandle,
    console: &Arc<ConsoleHandle>,
    process: Option<BoxedProcess>,
) -> u64 {
    let outcome = console.attach(process);
    emit_status_lines(app, console, &outcome.lines);
    schedule_refresh(app, console);
    outcome.generation
}

pub fn emit_status_lines(app: &tauri::AppHandle, console: &Arc<ConsoleHandle>, lines: &[String]) {
    let colors_enabled = console.config().colors_enabled;
    for line in lines {
        let payload = LinePayload {
            text: line.clone(),
            color: colors_enabled.then(|| STATUS_LINE_COLOR.to_string()),
        };
        if let Err(err) = app.emit_to(console.label(), CONSOLE_LINE_EVENT, payload) {
            tracing::warn!(console = %console.label(), "发送控制台状态行失败: {err}");
        }
    }
}

/// Plain game output (uncolored, regardless of the color option).
pub fn emit_output_line(app: &tauri::AppHandle, label: &str, text: String) {
    let _ = app.emit_to(
        label,
        CONSOLE_LINE_EVENT,
        LinePayload { text, color: None },
    );
}

/// Post a visual refresh onto the UI thread. The snapshot is taken now so
/// the refresh reflects the state at posting time, not at execution time.
pub fn schedule_refresh(app: &tauri::AppHandle, console: &Arc<ConsoleHandle>) {
    let visual = console.visual_state();
    let label = console.label().to_string();
    let app_handle = app.clone();
    if let Err(err) = app.run_on_main_thread(move || apply_visual_state(&app_handle, &label, visual))
    {
        tracing::warn!("调度控制台刷新失败: {err}");
    }
}

fn apply_visual_state(app: &tauri::AppHandle, label: &str, visual: VisualState) {
    #[cfg(desktop)]
    {
        use crate::app::tray::{tray_id, TRAY_IDLE_ICON, TRAY_RUNNING_ICON};
        use crate::domain::console::IconVariant;

        let icon_bytes: &[u8] = match visual.icon {
            IconVariant::Running => TRAY_RUNNING_ICON,
            IconVariant::Idle => TRAY_IDLE_ICON,
        };

        if let Some(window) = app.get_webview_window(label) {
            if let Ok(icon) = tauri::image::Image::from_bytes(icon_bytes) {
                let _ = window.set_icon(icon);
            }
        }
        if let Some(tray) = app.tray_by_id(tray_id(label).as_str()) {
            if let Ok(icon) = tauri::image::Image::from_bytes(icon_bytes) {
                let _ = tray.set_icon(Some(icon));
            }
        }
    }

    let _ = app.emit_to(label, CONSOLE_STATE_EVENT, visual);
}

/// Kill flow: blocking confirmation first (outside any lock), then
/// terminate-and-detach under the console's lock. Deliberately applies to
/// whatever is tracked once the user confirms. Always ends with a refresh,
/// which is idempotent when nothing was tracked.
///
/// Must run off the main thread (the confirmation dialog blocks).
pub fn request_kill(app: &tauri::AppHandle, console: &Arc<ConsoleHandle>) {
    if !confirm_kill(app) {
        return;
    }

    let outcome = console.kill_tracked();
    if outcome.terminated {
        tracing::info!(console = %console.label(), "已请求强制结束游戏进程");
    }
    emit_status_lines(app, console, &outcome.lines);
    schedule_refresh(app, console);
}

fn confirm_kill(app: &tauri::AppHandle) -> bool {
    use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

    app.dialog()
        .message("确定要强制结束游戏进程吗？未保存的进度将会丢失。")
        .title("强制结束")
        .kind(MessageDialogKind::Warning)
        .buttons(MessageDialogButtons::OkCancelCustom(
            "强制结束".to_string(),
            "取消".to_string(),
        ))
        .blocking_show()
}

/// Full close: kill first iff kill-on-close (confirmation included, and the
/// window closes even when the user declines), release the tray, destroy
/// the window. Must run off the main thread.
pub fn close_console(app: &tauri::AppHandle, label: &str) {
    run_close_sequence(
        find_console(app, label).as_ref(),
        |console| request_kill(app, console),
        |console| {
            #[cfg(desktop)]
            crate::app::tray::remove_console_tray(app, console.label());
            console.set_tray_present(false);
        },
        || {
            if let Some(window) = app.get_webview_window(label) {
                if let Err(err) = window.destroy() {
                    tracing::warn!(console = %label, "销毁控制台窗口失败: {err}");
                }
            }
        },
    );
}

/// Ordered close steps shared by the close button and the window close
/// request: the kill (only when kill-on-close is set and a process is
/// tracked) runs first, the tray is released after it, and the window
/// is destroyed last.
fn run_close_sequence(
    console: Option<&Arc<ConsoleHandle>>,
    kill: impl FnOnce(&Arc<ConsoleHandle>),
    release_tray: impl FnOnce(&Arc<ConsoleHandle>),
    destroy_window: impl FnOnce(),
) {
    if let Some(console) = console {
        if console.has_process() && console.kill_on_close() {
            kill(console);
        }
        if console.tray_present() {
            release_tray(console);
        }
    }

    destroy_window();
}

/// Secondary-button flow: hide to tray when there is something to come
/// back to (tracked process + tray), otherwise a full close.
pub fn contextual_close(app: &tauri::AppHandle, label: &str) {
    let Some(console) = find_console(app, label) else {
        if let Some(window) = app.get_webview_window(label) {
            let _ = window.close();
        }
        return;
    };

    if !console.has_process() || !console.tray_present() {
        close_console(app, label);
    } else {
        if let Some(window) = app.get_webview_window(label) {
            let _ = window.hide();
        }
        schedule_refresh(app, &console);
    }
}

pub fn show_console(app: &tauri::AppHandle, label: &str) {
    let Some(window) = app.get_webview_window(label) else {
        return;
    };

    let _ = window.show();
    let _ = window.unminimize();
    let _ = window.set_focus();
}

pub fn show_main_window(app: &tauri::AppHandle) {
    let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) else {
        return;
    };

    let _ = window.show();
    let _ = window.unminimize();
    let _ = window.set_focus();
}

pub fn on_window_event(window: &tauri::Window, event: &tauri::WindowEvent) {
    let label = window.label().to_string();
    if !label.starts_with(CONSOLE_LABEL_PREFIX) {
        return;
    }

    match event {
        tauri::WindowEvent::CloseRequested { api, .. } => {
            // The close path may block on the kill confirmation; run it off
            // the event loop and destroy the window ourselves.
            api.prevent_close();
            let app = window.app_handle().clone();
            tauri::async_runtime::spawn_blocking(move || close_console(&app, &label));
        }
        tauri::WindowEvent::Destroyed => {
            let app = window.app_handle().clone();
            handle_destroyed(&app, &label);
        }
        _ => {}
    }
}

fn handle_destroyed(app: &tauri::AppHandle, label: &str) {
    // Destroy can bypass `close_console` (app teardown), so release the
    // tray here as well before the registry entry goes away.
    #[cfg(desktop)]
    if let Some(console) = find_console(app, label) {
        if console.tray_present() {
            crate::app::tray::remove_console_tray(app, label);
            console.set_tray_present(false);
        }
    }

    let state = app.state::<ConsoleRegistryState>();
    state.0.lock_or_recover().remove(label);
    tracing::debug!(console = %label, "控制台窗口已销毁并从注册表移除");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::console::ConsoleConfig;
    use crate::domain::process::{ExitPoll, ProcessHandle};
    use crate::domain::registry::ConsoleRegistry;
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProcess {
        terminations: Arc<AtomicUsize>,
    }

    impl ProcessHandle for CountingProcess {
        fn pid(&self) -> u32 {
            7
        }

        fn poll_exit(&mut self) -> ExitPoll {
            ExitPoll::Running
        }

        fn terminate(&mut self) {
            self.terminations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn console(label: &str, kill_on_close: bool) -> Arc<ConsoleHandle> {
        Arc::new(ConsoleHandle::new(
            label.to_string(),
            ConsoleConfig {
                num_lines: 1000,
                colors_enabled: false,
            },
            kill_on_close,
        ))
    }

    fn tracked_console(kill_on_close: bool) -> (Arc<ConsoleHandle>, Arc<AtomicUsize>) {
        let handle = console("console-1", kill_on_close);
        let terminations = Arc::new(AtomicUsize::new(0));
        handle.attach(Some(Box::new(CountingProcess {
            terminations: terminations.clone(),
        })));
        (handle, terminations)
    }

    #[test]
    fn close_kills_exactly_once_before_releasing_the_tray() {
        let (handle, terminations) = tracked_console(true);
        handle.set_tray_present(true);
        let steps = RefCell::new(Vec::new());

        run_close_sequence(
            Some(&handle),
            |console| {
                let outcome = console.kill_tracked();
                assert!(outcome.terminated);
                steps.borrow_mut().push("kill");
            },
            |console| {
                // The termination request already happened by the time
                // the tray goes away.
                assert_eq!(terminations.load(Ordering::SeqCst), 1);
                console.set_tray_present(false);
                steps.borrow_mut().push("tray");
            },
            || steps.borrow_mut().push("destroy"),
        );

        assert_eq!(steps.into_inner(), vec!["kill", "tray", "destroy"]);
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
        assert!(!handle.has_process());
        assert!(!handle.tray_present());
    }

    #[test]
    fn close_without_kill_on_close_leaves_the_process_running() {
        let (handle, terminations) = tracked_console(false);
        handle.set_tray_present(true);
        let steps = RefCell::new(Vec::new());

        run_close_sequence(
            Some(&handle),
            |_| steps.borrow_mut().push("kill"),
            |_| steps.borrow_mut().push("tray"),
            || steps.borrow_mut().push("destroy"),
        );

        assert_eq!(steps.into_inner(), vec!["tray", "destroy"]);
        assert_eq!(terminations.load(Ordering::SeqCst), 0);
        assert!(handle.has_process());
    }

    #[test]
    fn close_of_an_idle_tray_less_console_only_destroys_the_window() {
        let handle = console("console-1", true);
        let steps = RefCell::new(Vec::new());

        run_close_sequence(
            Some(&handle),
            |_| steps.borrow_mut().push("kill"),
            |_| steps.borrow_mut().push("tray"),
            || steps.borrow_mut().push("destroy"),
        );

        assert_eq!(steps.into_inner(), vec!["destroy"]);
    }

    #[test]
    fn close_of_an_unregistered_label_still_destroys_the_window() {
        let steps = RefCell::new(Vec::new());

        run_close_sequence(
            None,
            |_| steps.borrow_mut().push("kill"),
            |_| steps.borrow_mut().push("tray"),
            || steps.borrow_mut().push("destroy"),
        );

        assert_eq!(steps.into_inner(), vec!["destroy"]);
    }

    #[test]
    fn opening_requests_closure_of_every_prior_console() {
        let mut registry = ConsoleRegistry::default();
        registry.register(console("console-1", false));
        registry.register(console("console-2", false));
        let priors = registry.register(console("console-3", false));

        let requested = RefCell::new(Vec::new());
        let removed = RefCell::new(Vec::new());

        dispatch_prior_closes(
            priors,
            |prior| {
                requested.borrow_mut().push(prior.label().to_string());
                // console-1's window is already gone.
                prior.label() != "console-1"
            },
            |label| removed.borrow_mut().push(label.to_string()),
        );

        assert_eq!(requested.into_inner(), vec!["console-1", "console-2"]);
        assert_eq!(removed.into_inner(), vec!["console-1"]);
    }
}
