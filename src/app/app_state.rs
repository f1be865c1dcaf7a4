//! Usage: Shared Tauri state types used by `commands/*` and window event hooks.

use crate::domain::registry::ConsoleRegistry;
use std::sync::Mutex;

/// The injected window-manager service: owns the collection of open
/// console windows under its own lock.
#[derive(Default)]
pub(crate) struct ConsoleRegistryState(pub(crate) Mutex<ConsoleRegistry>);
