//! Usage: Console window commands (kill / close / show / flags / state).

use crate::app::console_window;
use crate::domain::console::{ConsoleHandle, VisualState};
use std::sync::Arc;

fn resolve(app: &tauri::AppHandle, label: &str) -> Result<Arc<ConsoleHandle>, String> {
    console_window::find_console(app, label).ok_or_else(|| format!("未找到控制台窗口: {label}"))
}

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct ConsoleStatus {
    kill_on_close: bool,
    visual: VisualState,
}

#[tauri::command]
pub(crate) fn console_status_get(
    app: tauri::AppHandle,
    label: String,
) -> Result<ConsoleStatus, String> {
    let console = resolve(&app, &label)?;
    Ok(ConsoleStatus {
        kill_on_close: console.kill_on_close(),
        visual: console.visual_state(),
    })
}

#[tauri::command]
pub(crate) fn console_set_kill_on_close(
    app: tauri::AppHandle,
    label: String,
    enabled: bool,
) -> Result<(), String> {
    let console = resolve(&app, &label)?;
    console.set_kill_on_close(enabled);
    Ok(())
}

/// Force-close button / tray menu entry. Blocks on the confirmation
/// dialog, so the whole flow runs on a blocking-task thread.
#[tauri::command]
pub(crate) async fn console_kill(app: tauri::AppHandle, label: String) -> Result<(), String> {
    let console = resolve(&app, &label)?;
    tauri::async_runtime::spawn_blocking(move || {
        console_window::request_kill(&app, &console);
    })
    .await
    .map_err(|e| format!("强制结束任务失败: {e}"))
}

/// Secondary button: hide to tray, or full close when there is no tracked
/// process or no tray icon.
#[tauri::command]
pub(crate) async fn console_contextual_close(
    app: tauri::AppHandle,
    label: String,
) -> Result<(), String> {
    tauri::async_runtime::spawn_blocking(move || {
        console_window::contextual_close(&app, &label);
    })
    .await
    .map_err(|e| format!("关闭控制台任务失败: {e}"))
}

/// Bring the most recently opened console back to front (main window
/// action; the tray uses its own per-console binding).
#[tauri::command]
pub(crate) fn console_show_active(app: tauri::AppHandle) -> Result<bool, String> {
    match console_window::active_console(&app) {
        Some(console) => {
            console_window::show_console(&app, console.label());
            Ok(true)
        }
        None => Ok(false),
    }
}
