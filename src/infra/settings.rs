//! Usage: Persisted application settings (schema + read/write helpers).

use crate::infra::app_paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 2;
const SCHEMA_VERSION_ADD_CONSOLE_OPTIONS: u32 = 2;

pub const DEFAULT_CONSOLE_LOG_LINES: u32 = 1000;
const MAX_CONSOLE_LOG_LINES: u32 = 100_000;

const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub schema_version: u32,
    // Console window options, fixed when the console is constructed.
    pub console_log_lines: u32,
    pub console_colors: bool,
    // Close the console window straight to tray when a tray icon exists.
    pub tray_enabled: bool,
    // Default for each new console's kill-on-close flag.
    pub kill_on_close: bool,
    pub auto_start: bool,
    // Game launch boundary: command + args handed to the spawner.
    pub game_command: String,
    pub game_args: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            console_log_lines: DEFAULT_CONSOLE_LOG_LINES,
            console_colors: true,
            tray_enabled: true,
            kill_on_close: false,
            auto_start: false,
            game_command: String::new(),
            game_args: Vec::new(),
        }
    }
}

fn sanitize_console_log_lines(settings: &mut AppSettings) -> bool {
    let mut changed = false;

    if settings.console_log_lines == 0 {
        settings.console_log_lines = DEFAULT_CONSOLE_LOG_LINES;
        changed = true;
    }
    if settings.console_log_lines > MAX_CONSOLE_LOG_LINES {
        settings.console_log_lines = MAX_CONSOLE_LOG_LINES;
        changed = true;
    }

    changed
}

fn sanitize_game_command(settings: &mut AppSettings) -> bool {
    let trimmed = settings.game_command.trim();
    if trimmed.len() != settings.game_command.len() {
        settings.game_command = trimmed.to_string();
        return true;
    }
    false
}

/// Clamp out-of-range values and bump the schema version. Returns whether
/// anything changed (the caller persists the sanitized copy in that case).
pub fn sanitize(settings: &mut AppSettings) -> bool {
    let mut changed = false;

    if settings.schema_version < SCHEMA_VERSION_ADD_CONSOLE_OPTIONS {
        settings.schema_version = SCHEMA_VERSION;
        changed = true;
    }

    changed |= sanitize_console_log_lines(settings);
    changed |= sanitize_game_command(settings);

    changed
}

pub fn settings_file_path(app: &tauri::AppHandle) -> Result<PathBuf, String> {
    Ok(app_paths::app_data_dir(app)?.join(SETTINGS_FILENAME))
}

fn read_from(path: &Path) -> Result<AppSettings, String> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read settings file: {e}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("failed to parse settings file: {e}"))
}

fn write_to(path: &Path, settings: &AppSettings) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("failed to serialize settings: {e}"))?;
    std::fs::write(path, raw).map_err(|e| format!("failed to write settings file: {e}"))
}

pub fn read(app: &tauri::AppHandle) -> Result<AppSettings, String> {
    let path = settings_file_path(app)?;
    let mut settings = read_from(&path)?;
    if sanitize(&mut settings) {
        // Best-effort: a read must not fail because the rewrite did.
        if let Err(err) = write_to(&path, &settings) {
            tracing::warn!("回写规范化后的设置失败: {err}");
        }
    }
    Ok(settings)
}

pub fn write(app: &tauri::AppHandle, settings: &AppSettings) -> Result<(), String> {
    let path = settings_file_path(app)?;
    write_to(&path, settings)
}
