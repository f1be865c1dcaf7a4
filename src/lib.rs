mod app;
mod commands;
mod domain;
mod infra;
mod shared;

use app::app_state::ConsoleRegistryState;
use app::console_window;
use commands::*;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let builder = tauri::Builder::default()
        .manage(ConsoleRegistryState::default())
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init());

    #[cfg(desktop)]
    let builder = builder
        .plugin(tauri_plugin_autostart::Builder::new().build())
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            console_window::show_main_window(app);
        }));

    let app = builder
        .on_window_event(console_window::on_window_event)
        .setup(|app| {
            crate::app::logging::init(app.handle());

            #[cfg(desktop)]
            {
                if let Err(err) = app
                    .handle()
                    .plugin(tauri_plugin_updater::Builder::new().build())
                {
                    tracing::error!("updater 初始化失败: {}", err);
                }
            }

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            launch_game,
            console_status_get,
            console_set_kill_on_close,
            console_kill,
            console_contextual_close,
            console_show_active,
            settings_get,
            settings_set,
            notice_send,
            app_exit,
            app_restart
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| {
        if let tauri::RunEvent::ExitRequested { api, code, .. } = &event {
            // Note: `prevent_exit` is ignored for restart requests.
            // For app_restart we run cleanup explicitly before requesting restart.
            if *code != Some(tauri::RESTART_EXIT_CODE) {
                tracing::info!("收到退出请求，开始清理...");
                api.prevent_exit();

                let app_handle = app_handle.clone();
                tauri::async_runtime::spawn(async move {
                    crate::app::cleanup::cleanup_before_exit(&app_handle).await;
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    std::process::exit(0);
                });
            }
            return;
        }

        #[cfg(target_os = "macos")]
        if let tauri::RunEvent::Reopen {
            has_visible_windows,
            ..
        } = event
        {
            if !has_visible_windows {
                console_window::show_main_window(app_handle);
            }
        }
    });
}
