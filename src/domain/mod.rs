//! Usage: Domain layer (process supervision core, free of Tauri wiring).

pub(crate) mod console;
pub(crate) mod process;
pub(crate) mod registry;
