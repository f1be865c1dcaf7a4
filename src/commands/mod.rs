//! Usage: Tauri command surface (thin IPC wrappers over app/domain logic).

pub(crate) mod app;
pub(crate) mod console;
pub(crate) mod launch;
pub(crate) mod settings;

pub(crate) use app::*;
pub(crate) use console::*;
pub(crate) use launch::*;
pub(crate) use settings::*;
