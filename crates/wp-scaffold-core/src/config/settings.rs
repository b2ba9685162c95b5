//! Runtime settings resolved from environment variables

use crate::profile::PlatformProfile;
use std::path::PathBuf;
use std::time::Duration;

/// Timeout for archive downloads (5 minutes)
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for plain HTTP calls (secret keys, installer)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for external commands (git, mysql, npm)
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Runtime knobs for one scaffold run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Location of the persisted defaults file
    pub config_path: PathBuf,
    pub fetch_timeout: Duration,
    pub http_timeout: Duration,
    pub command_timeout: Duration,
    /// Socket of the local dev stack's database
    pub mysql_socket: PathBuf,
}

impl Settings {
    /// Resolve settings from the process environment
    pub fn from_env<C: PlatformProfile>(profile: &C) -> Self {
        Self::from_lookup(profile, |key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary key lookup.
    ///
    /// Unset, empty or unparsable values fall back to the defaults.
    pub fn from_lookup<C, F>(profile: &C, lookup: F) -> Self
    where
        C: PlatformProfile,
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            lookup(&format!("{}_{}", profile.env_prefix(), suffix)).filter(|v| !v.trim().is_empty())
        };
        let seconds = |suffix: &str, default: Duration| {
            var(suffix)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Self {
            config_path: var("CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|| default_config_path(profile.name())),
            fetch_timeout: seconds("FETCH_TIMEOUT", DEFAULT_FETCH_TIMEOUT),
            http_timeout: seconds("HTTP_TIMEOUT", DEFAULT_HTTP_TIMEOUT),
            command_timeout: seconds("COMMAND_TIMEOUT", DEFAULT_COMMAND_TIMEOUT),
            mysql_socket: var("MYSQL_SOCKET")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(profile.local_stack_socket())),
        }
    }
}

/// `<user config dir>/<name>/config.yaml`, or the working directory when the
/// platform has no notion of a config dir
fn default_config_path(name: &str) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
        .join("config.yaml")
}
