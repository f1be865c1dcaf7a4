//! Usage: Ordered collection of open console windows (single-active policy).
//!
//! Injected as Tauri-managed state instead of a process-global static:
//! the registry owns the collection under its own lock, and entries are
//! removed when their window is destroyed, so the list never accumulates
//! dead consoles.

use crate::domain::console::ConsoleHandle;
use std::sync::Arc;

#[derive(Default)]
pub struct ConsoleRegistry {
    consoles: Vec<Arc<ConsoleHandle>>,
}

impl ConsoleRegistry {
    /// Add a console and return every previously-registered one, in open
    /// order. The caller requests closure of each returned console; they
    /// leave the registry through `remove` once their window is actually
    /// destroyed.
    pub fn register(&mut self, console: Arc<ConsoleHandle>) -> Vec<Arc<ConsoleHandle>> {
        let priors = self.consoles.clone();
        self.consoles.push(console);
        priors
    }

    pub fn find(&self, label: &str) -> Option<Arc<ConsoleHandle>> {
        self.consoles
            .iter()
            .find(|console| console.label() == label)
            .cloned()
    }

    /// Most recently opened console, the one the tray menu acts on.
    pub fn latest(&self) -> Option<Arc<ConsoleHandle>> {
        self.consoles.last().cloned()
    }

    pub fn remove(&mut self, label: &str) {
        self.consoles.retain(|console| console.label() != label);
    }

    pub fn all(&self) -> Vec<Arc<ConsoleHandle>> {
        self.consoles.clone()
    }
}
