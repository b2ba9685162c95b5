//! Persisted defaults file (author metadata, source references, last seen release)

use crate::version::VersionTag;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk record of defaults carried between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedConfig {
    pub author_name: String,
    #[serde(rename = "authorURI")]
    pub author_uri: String,
    pub theme_url: String,
    pub build_tool_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_known_version: Option<VersionTag>,
}

/// Values written when the first run creates the record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialPersistedConfig {
    pub author_name: String,
    pub author_uri: String,
    pub theme_url: String,
    pub build_tool_url: String,
    pub latest_known_version: Option<VersionTag>,
}

impl From<PartialPersistedConfig> for PersistedConfig {
    fn from(values: PartialPersistedConfig) -> Self {
        Self {
            author_name: values.author_name,
            author_uri: values.author_uri,
            theme_url: values.theme_url,
            build_tool_url: values.build_tool_url,
            latest_known_version: values.latest_known_version,
        }
    }
}

/// Result of [`ConfigStore::load`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedConfig {
    /// False on first run, or when the file could not be read or parsed
    pub found: bool,
    pub data: PersistedConfig,
}

/// File-backed store for [`PersistedConfig`]
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record. Never fails: a missing, unreadable or corrupt file all
    /// report `found = false` with a zero-valued record.
    pub fn load(&self) -> LoadedConfig {
        match self.read() {
            Ok(data) => LoadedConfig { found: true, data },
            Err(_) => LoadedConfig::default(),
        }
    }

    /// Write a new record
    pub fn create(&self, values: PartialPersistedConfig) -> Result<()> {
        self.write(&values.into())
    }

    /// Rewrite only the latest known version, keeping every other field
    pub fn update_version(&self, version: &VersionTag) -> Result<()> {
        let mut data = self.read().unwrap_or_default();
        data.latest_known_version = Some(version.clone());
        self.write(&data)
    }

    fn read(&self) -> Result<PersistedConfig> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn write(&self, data: &PersistedConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        let content = serde_yaml::to_string(data).context("Failed to serialize config")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
