//! Platform profile trait for CLI binaries
//!
//! This trait describes the platform being scaffolded (where its releases live,
//! how its tree is laid out, which endpoints it exposes) so the pipeline itself
//! stays free of hard-coded platform details.

use crate::answers::ScaffoldParameters;
use crate::version::VersionTag;
use std::path::Path;

/// Configuration trait for a scaffoldable platform
///
/// Each binary implements this trait to define:
/// - Product identity (name, display name)
/// - Upstream release source and archive locators
/// - Layout of the fetched platform tree
/// - External endpoints (secret keys, installer)
/// - Post-setup instructions
pub trait PlatformProfile: Clone + Send + Sync + 'static {
    /// Internal product name (used for the config directory and user agent)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Git repository queried for release tags
    fn upstream_repository(&self) -> &'static str;

    /// Archive locator for a given platform release
    fn archive_locator(&self, version: &VersionTag) -> String;

    /// Content directory inside the platform tree (holds themes, uploads)
    fn content_dir(&self) -> &'static str;

    /// Themes directory inside the platform tree
    fn themes_dir(&self) -> &'static str;

    /// Endpoint returning salt/key definitions for the generated config
    fn secret_key_url(&self) -> &'static str;

    /// Installer path, relative to the site URL
    fn installer_path(&self) -> &'static str;

    /// Name of the options table without the table prefix
    fn options_table(&self) -> &'static str;

    /// Socket the local dev stack's database listens on
    fn local_stack_socket(&self) -> &'static str;

    /// Default directory name for the new theme
    fn default_theme_name(&self) -> &'static str;

    /// Default database table prefix
    fn default_table_prefix(&self) -> &'static str;

    /// Prefix for environment variable overrides (e.g. `WP_SCAFFOLD`)
    fn env_prefix(&self) -> &'static str;

    /// URL for platform documentation
    fn docs_url(&self) -> &'static str;

    /// Generate the "next steps" instructions after the project is created
    fn next_steps(&self, dir: &Path, params: &ScaffoldParameters) -> Vec<String>;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}
