//! External tools and drivers
//!
//! This module provides:
//! - A timeout-bounded command runner
//! - Tool detection (git, mysql, npm)
//! - The git version-control driver and the mysql database driver
//! - Post-scaffold dependency installation

pub mod check;
pub mod command;
pub mod git;
pub mod install;
pub mod mysql;

pub use check::{check_tool, check_tools, RuntimeInfo, Tool};
pub use command::{CommandOutput, CommandRunner};
pub use git::{GitCli, VersionControl};
pub use install::{DependencyInstaller, InstallStatus};
pub use mysql::{Connection, ConnectionOptions, Database, MysqlCli, Rows};
