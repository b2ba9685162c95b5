//! Fetching remote archives (platform core, theme, build tool)
//!
//! Archives are downloaded over HTTP and unpacked with their top-level
//! directory stripped. Downloads are bounded by a timeout so a stalled
//! server cannot hang the run.

pub mod unpack;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

pub use unpack::{unpack, ArchiveFormat};

/// Downloads an archive and unpacks it into a directory
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    async fn fetch(&self, locator: &str, destination: &Path) -> Result<()>;
}

/// Archive fetcher over HTTP(S)
pub struct HttpArchiveFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpArchiveFetcher {
    /// Create a new fetcher with a custom user agent and download timeout
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            timeout,
        }
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch archive from {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch archive from {}: HTTP {}",
                url,
                response.status()
            );
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ArchiveFetcher for HttpArchiveFetcher {
    async fn fetch(&self, locator: &str, destination: &Path) -> Result<()> {
        let url =
            Url::parse(locator).with_context(|| format!("Invalid archive locator: {}", locator))?;

        let bytes = match timeout(self.timeout, self.download(url)).await {
            Ok(bytes) => bytes?,
            Err(_) => anyhow::bail!(
                "Fetching {} timed out after {} seconds",
                locator,
                self.timeout.as_secs()
            ),
        };

        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || unpack(&bytes, &destination))
            .await
            .context("Archive extraction task failed")??;

        Ok(())
    }
}
