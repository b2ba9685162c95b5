//! WP Scaffold Core - Shared library for bootstrapping WordPress projects
//!
//! This library turns a handful of answers into a ready-to-develop project:
//! it downloads a platform release, swaps the bundled themes for a starter
//! theme, optionally adds a front-end build tool, writes the config files,
//! and can provision a local database and an initial git commit.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Config persistence, release detection, reference
//!   normalization, archive fetching, template rendering, external tool drivers
//! - **Layer 2: Workflow Orchestration** - `PlatformProfile` trait and the staged
//!   `Orchestrator`, driven through the `Prompter` and `Reporter` seams
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use wp_scaffold_core::{reference, version};
//!
//! let locator = reference::normalize("https://github.com/org/theme");
//! assert_eq!(locator, "https://github.com/org/theme/archive/master.tar.gz");
//!
//! let latest = version::latest_tag(&["6.3", "6.4.2", "6.10"]);
//! ```

pub mod answers;
pub mod archive;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod profile;
pub mod reference;
pub mod render;
pub mod runtime;
pub mod services;
pub mod version;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use answers::{Prompter, ScaffoldParameters};
pub use config::{ConfigStore, PersistedConfig, Settings};
pub use error::ScaffoldError;
pub use pipeline::{Orchestrator, Reporter, RunReport, Services, Stage, StageStatus};
pub use profile::PlatformProfile;
pub use version::VersionTag;

#[cfg(feature = "tui")]
pub use tui::{run, ScaffoldArgs};
