//! Usage: Settings commands (read / sanitize / persist / apply side effects).

use crate::infra::settings::{self, AppSettings};

#[tauri::command]
pub(crate) fn settings_get(app: tauri::AppHandle) -> Result<AppSettings, String> {
    settings::read(&app)
}

#[tauri::command]
pub(crate) fn settings_set(
    app: tauri::AppHandle,
    mut new_settings: AppSettings,
) -> Result<AppSettings, String> {
    settings::sanitize(&mut new_settings);
    settings::write(&app, &new_settings)?;

    #[cfg(desktop)]
    {
        use tauri_plugin_autostart::ManagerExt;

        let autolaunch = app.autolaunch();
        let result = if new_settings.auto_start {
            autolaunch.enable()
        } else {
            autolaunch.disable()
        };
        if let Err(err) = result {
            // Settings are already persisted; autostart stays best-effort.
            tracing::warn!("更新开机自启失败: {err}");
        }
    }

    Ok(new_settings)
}
