//! Persisted defaults and runtime settings
//!
//! This module provides:
//! - The persisted defaults file (`ConfigStore`, `PersistedConfig`)
//! - Environment-driven runtime settings (`Settings`)

pub mod settings;
pub mod store;

pub use settings::Settings;
pub use store::{ConfigStore, LoadedConfig, PartialPersistedConfig, PersistedConfig};
