//! Usage: Application layer (Tauri-managed state, console window/tray lifecycle, startup wiring).

pub(crate) mod app_state;
pub(crate) mod cleanup;
pub(crate) mod console_window;
pub(crate) mod logging;
pub(crate) mod notice;

#[cfg(desktop)]
pub(crate) mod tray;
