//! Usage: Game launch boundary (spawn + console attach + exit monitor).
//!
//! Spawning and attaching run on a blocking-task thread: attachment from
//! off the UI thread is the normal case, and the console marshals its own
//! refreshes back onto the main thread.

use crate::app::console_window;
use crate::app::notice;
use crate::domain::console::{ConsoleHandle, MonitorTick};
use crate::domain::process::ChildProcess;
use crate::infra::settings;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Launch the configured game command and open a console window
/// supervising it. Returns the console's window label.
#[tauri::command]
pub(crate) async fn launch_game(app: tauri::AppHandle) -> Result<String, String> {
    let config = settings::read(&app)?;
    if config.game_command.is_empty() {
        return Err("未配置游戏启动命令，请先在设置中填写".to_string());
    }

    tauri::async_runtime::spawn_blocking(move || launch_inner(&app, &config))
        .await
        .map_err(|e| format!("启动任务失败: {e}"))?
}

fn launch_inner(app: &tauri::AppHandle, config: &settings::AppSettings) -> Result<String, String> {
    let console = console_window::open_console(app, config)?;

    let mut command = Command::new(&config.game_command);
    command
        .args(&config.game_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .map_err(|e| format!("启动游戏进程失败: {e}"))?;
    let pid = child.id();

    if let Some(stdout) = child.stdout.take() {
        spawn_output_reader(app.clone(), console.label().to_string(), stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_output_reader(app.clone(), console.label().to_string(), stderr);
    }

    let generation =
        console_window::attach_and_render(app, &console, Some(Box::new(ChildProcess::new(child))));
    tracing::info!(pid, console = console.label(), "游戏进程已启动并附加到控制台");

    spawn_exit_monitor(app.clone(), console.clone(), generation);

    Ok(console.label().to_string())
}

fn spawn_output_reader(app: tauri::AppHandle, label: String, stream: impl Read + Send + 'static) {
    std::thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let Ok(text) = line else { break };
            console_window::emit_output_line(&app, &label, text);
        }
    });
}

/// Background exit reporter: polls the supervisor until the process it was
/// started for exits naturally (detach + status line + refresh) or is
/// replaced/detached by someone else.
fn spawn_exit_monitor(app: tauri::AppHandle, console: Arc<ConsoleHandle>, generation: u64) {
    std::thread::spawn(move || loop {
        match console.poll_natural_exit(generation) {
            MonitorTick::StillRunning => std::thread::sleep(EXIT_POLL_INTERVAL),
            MonitorTick::Exited(lines) => {
                tracing::info!(console = console.label(), "游戏进程已自行退出");
                notify_if_hidden(&app, console.label(), &lines);
                console_window::emit_status_lines(&app, &console, &lines);
                console_window::schedule_refresh(&app, &console);
                break;
            }
            MonitorTick::Superseded => break,
        }
    });
}

fn notify_if_hidden(app: &tauri::AppHandle, label: &str, lines: &[String]) {
    use tauri::Manager;

    let hidden = app
        .get_webview_window(label)
        .map(|window| !window.is_visible().unwrap_or(true))
        .unwrap_or(false);
    if hidden {
        let body = lines
            .first()
            .cloned()
            .unwrap_or_else(|| "游戏进程已退出".to_string());
        notice::emit_game_exited(app, body);
    }
}
