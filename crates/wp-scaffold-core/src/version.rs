//! Upstream release detection and version comparison

use crate::config::ConfigStore;
use crate::runtime::command::CommandRunner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Placeholder returned when neither the upstream nor the config knows a version
const UNKNOWN_VERSION: &str = "unknown";

/// A release tag such as `6.4` or `6.4.2`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Sentinel for "no version could be determined"
    pub fn unknown() -> Self {
        Self(UNKNOWN_VERSION.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_VERSION
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Three-component form used for comparison (`x.y` becomes `x.y.0`)
    pub fn normalized(&self) -> Option<Version> {
        normalize(&self.0)
    }

    /// Semantic ordering; `None` when either side is not a version
    pub fn compare(&self, other: &VersionTag) -> Option<Ordering> {
        Some(self.normalized()?.cmp(&other.normalized()?))
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check that a string is dot-separated digit groups (at least two)
fn is_version_shaped(tag: &str) -> bool {
    let groups: Vec<&str> = tag.split('.').collect();
    groups.len() >= 2
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit()))
}

/// Normalize a two-component tag to three components and parse it
pub fn normalize(tag: &str) -> Option<Version> {
    let tag = tag.trim();
    if !is_version_shaped(tag) {
        return None;
    }
    let padded = if tag.matches('.').count() == 1 {
        format!("{}.0", tag)
    } else {
        tag.to_string()
    };
    Version::parse(&padded).ok()
}

/// Extract tag names from `git ls-remote --tags` output
pub fn parse_ls_remote(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter_map(|reference| reference.strip_prefix("refs/tags/"))
        .map(|name| name.strip_suffix("^{}").unwrap_or(name))
        .filter(|name| is_version_shaped(name))
        .map(str::to_string)
        .collect()
}

/// Pick the greatest version-shaped tag
pub fn latest_tag<S: AsRef<str>>(tags: &[S]) -> Option<VersionTag> {
    tags.iter()
        .filter_map(|tag| normalize(tag.as_ref()).map(|v| (v, tag.as_ref())))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, tag)| VersionTag::new(tag))
}

/// Source of published release tags
#[async_trait]
pub trait TagSource: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<String>>;
}

/// Lists tags of a remote git repository with `git ls-remote`
pub struct GitTagSource {
    repository: String,
    runner: CommandRunner,
}

impl GitTagSource {
    pub fn new(repository: impl Into<String>, runner: CommandRunner) -> Self {
        Self {
            repository: repository.into(),
            runner,
        }
    }
}

#[async_trait]
impl TagSource for GitTagSource {
    async fn list_tags(&self) -> Result<Vec<String>> {
        let output = self
            .runner
            .run("git", &["ls-remote", "--tags", &self.repository], None)
            .await
            .with_context(|| format!("Failed to list tags of {}", self.repository))?;
        Ok(parse_ls_remote(&output.stdout))
    }
}

/// What [`VersionResolver::resolve`] found out
#[derive(Debug)]
pub struct Resolution {
    /// Version to offer as the default
    pub version: VersionTag,
    /// Latest tag published upstream, if the query succeeded
    pub discovered: Option<VersionTag>,
    /// Whether the persisted config was rewritten with the discovered tag
    pub updated: bool,
    /// Why the query or the config update failed, if it did
    pub failure: Option<anyhow::Error>,
}

/// Compares the latest upstream release against the persisted one
pub struct VersionResolver<'a> {
    tags: &'a dyn TagSource,
    store: &'a ConfigStore,
}

impl<'a> VersionResolver<'a> {
    pub fn new(tags: &'a dyn TagSource, store: &'a ConfigStore) -> Self {
        Self { tags, store }
    }

    /// Resolve the version to offer. Best effort: failures degrade to the
    /// known version, or [`VersionTag::unknown`] when there is none.
    pub async fn resolve(&self, known: Option<&VersionTag>) -> Resolution {
        let fallback = known.cloned().unwrap_or_else(VersionTag::unknown);

        let discovered = match self.tags.list_tags().await {
            Ok(tags) => latest_tag(&tags),
            Err(e) => {
                return Resolution {
                    version: fallback,
                    discovered: None,
                    updated: false,
                    failure: Some(e),
                }
            }
        };

        let Some(discovered) = discovered else {
            return Resolution {
                version: fallback,
                discovered: None,
                updated: false,
                failure: Some(anyhow::anyhow!("No release tags found upstream")),
            };
        };

        let Some(known) = known else {
            return Resolution {
                version: discovered.clone(),
                discovered: Some(discovered),
                updated: false,
                failure: None,
            };
        };

        // An unparsable stored value never wins against a real release
        let newer = match discovered.compare(known) {
            Some(ordering) => ordering == Ordering::Greater,
            None => known.normalized().is_none(),
        };

        if !newer {
            return Resolution {
                version: known.clone(),
                discovered: Some(discovered),
                updated: false,
                failure: None,
            };
        }

        let failure = self.store.update_version(&discovered).err();
        Resolution {
            version: discovered.clone(),
            discovered: Some(discovered),
            updated: failure.is_none(),
            failure,
        }
    }
}
