//! Usage: Per-console system tray icon (status mirror + popup menu).
//!
//! Creation is best-effort: a platform without tray support degrades the
//! console's secondary button to plain close. The menu dispatches back into
//! the console's show/kill operations; the tray holds no state of its own.

use crate::app::console_window;
use tauri::menu::{Menu, MenuItem, PredefinedMenuItem};
use tauri::tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent};
use tauri::Manager;

pub const TRAY_TOOLTIP: &str = "PackCraft 游戏控制台";

pub const TRAY_RUNNING_ICON: &[u8] = include_bytes!("../../icons/tray-running.png");
pub const TRAY_IDLE_ICON: &[u8] = include_bytes!("../../icons/tray-idle.png");

/// Tray icon id scoped to one console window, so a closing console never
/// tears down the tray of its replacement.
pub fn tray_id(label: &str) -> String {
    format!("{label}-tray")
}

pub fn setup_console_tray(app: &tauri::AppHandle, label: &str) -> Result<(), String> {
    let title_item = MenuItem::with_id(
        app,
        format!("{label}.tray.title"),
        TRAY_TOOLTIP,
        false,
        None::<&str>,
    )
    .map_err(|e| format!("failed to create tray title menu item: {e}"))?;
    let show_item = MenuItem::with_id(
        app,
        format!("{label}.tray.show"),
        "显示窗口",
        true,
        None::<&str>,
    )
    .map_err(|e| format!("failed to create tray show menu item: {e}"))?;
    let kill_item = MenuItem::with_id(
        app,
        format!("{label}.tray.kill"),
        "强制结束游戏进程",
        true,
        None::<&str>,
    )
    .map_err(|e| format!("failed to create tray kill menu item: {e}"))?;
    let separator = PredefinedMenuItem::separator(app)
        .map_err(|e| format!("failed to create tray menu separator: {e}"))?;

    let menu = Menu::with_items(app, &[&title_item, &separator, &show_item, &kill_item])
        .map_err(|e| format!("failed to create tray menu: {e}"))?;

    let show_id = show_item.id().clone();
    let kill_id = kill_item.id().clone();

    let icon = tauri::image::Image::from_bytes(TRAY_RUNNING_ICON)
        .map_err(|e| format!("failed to load tray icon: {e}"))?;

    let label_for_menu = label.to_string();
    let label_for_click = label.to_string();

    TrayIconBuilder::with_id(tray_id(label))
        .icon(icon)
        .tooltip(TRAY_TOOLTIP)
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_menu_event(move |app, event| {
            if event.id == show_id {
                console_window::show_console(app, &label_for_menu);
                return;
            }
            if event.id == kill_id {
                // The kill confirmation blocks; never run it on the tray
                // event (main) thread.
                let app = app.clone();
                let label = label_for_menu.clone();
                tauri::async_runtime::spawn_blocking(move || {
                    if let Some(console) = console_window::find_console(&app, &label) {
                        console_window::request_kill(&app, &console);
                    }
                });
            }
        })
        .on_tray_icon_event(move |tray, event| {
            if let TrayIconEvent::Click {
                button,
                button_state,
                ..
            } = event
            {
                if button == MouseButton::Left && button_state == MouseButtonState::Up {
                    console_window::show_console(tray.app_handle(), &label_for_click);
                }
            }
        })
        .build(app)
        .map_err(|e| format!("failed to build tray icon: {e}"))?;

    Ok(())
}

pub fn remove_console_tray(app: &tauri::AppHandle, label: &str) {
    let id = tray_id(label);
    if app.remove_tray_by_id(id.as_str()).is_none() {
        tracing::debug!(console = %label, "托盘图标已不存在，无需移除");
    }
}
