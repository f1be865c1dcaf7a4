//! Usage: Process-supervised console core (one tracked process per console).

mod supervisor;

#[cfg(test)]
mod tests;

pub(crate) use supervisor::{
    AttachOutcome, ConsoleConfig, ConsoleHandle, IconVariant, KillOutcome, MonitorTick,
    SecondaryAction, Supervisor, VisualState,
};
