//! Post-scaffold dependency installation

use super::check::{check_tool, Tool};
use super::command::CommandRunner;
use anyhow::Result;
use std::path::Path;

/// What happened when installing dependencies
#[derive(Debug, PartialEq, Eq)]
pub enum InstallStatus {
    Installed,
    /// Nothing to install, or no package manager available
    NotNeeded(&'static str),
}

/// Runs `npm install` in the project root
pub struct DependencyInstaller {
    runner: CommandRunner,
}

impl DependencyInstaller {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn install(&self, project_dir: &Path) -> Result<InstallStatus> {
        if !project_dir.join("package.json").exists() {
            return Ok(InstallStatus::NotNeeded("no package.json in the project"));
        }
        if !check_tool(Tool::Npm).available {
            return Ok(InstallStatus::NotNeeded("npm is not installed"));
        }

        self.runner
            .stream("npm", &["install"], Some(project_dir))
            .await?;
        Ok(InstallStatus::Installed)
    }
}
