//! Usage: Infrastructure layer (persisted settings, filesystem paths).

pub(crate) mod app_paths;
pub(crate) mod settings;
