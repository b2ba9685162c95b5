//! Version-control driver backed by the git CLI

use super::command::CommandRunner;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Version-control operations used when finalizing a project
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn init(&self, path: &Path) -> Result<()>;
    async fn add(&self, path: &Path, pattern: &str) -> Result<()>;
    async fn commit(&self, path: &Path, message: &str) -> Result<()>;
}

/// Runs `git` in the project directory
pub struct GitCli {
    runner: CommandRunner,
}

impl GitCli {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn init(&self, path: &Path) -> Result<()> {
        self.runner.run("git", &["init"], Some(path)).await?;
        Ok(())
    }

    async fn add(&self, path: &Path, pattern: &str) -> Result<()> {
        self.runner.run("git", &["add", pattern], Some(path)).await?;
        Ok(())
    }

    async fn commit(&self, path: &Path, message: &str) -> Result<()> {
        self.runner
            .run("git", &["commit", "-m", message], Some(path))
            .await?;
        Ok(())
    }
}
