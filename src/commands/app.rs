//! Usage: App-level Tauri commands (lifecycle, notifications).

use crate::app::notice;

#[tauri::command]
pub(crate) fn notice_send(
    app: tauri::AppHandle,
    level: notice::NoticeLevel,
    title: Option<String>,
    body: String,
) -> Result<(), String> {
    notice::emit(&app, notice::build(level, title, body))
}

#[tauri::command]
pub(crate) fn app_exit(app: tauri::AppHandle) -> Result<bool, String> {
    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(200));
        app.exit(0);
    });
    Ok(true)
}

#[tauri::command]
pub(crate) fn app_restart(app: tauri::AppHandle) -> Result<bool, String> {
    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(200));
        tauri::async_runtime::block_on(crate::app::cleanup::cleanup_before_exit(&app));
        app.request_restart();
    });
    Ok(true)
}
