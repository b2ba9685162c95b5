//! The scaffold pipeline
//!
//! A run is a fixed sequence of stages, awaited one at a time. Each stage
//! returns a [`StageOutcome`]; the orchestrator records it in a [`RunReport`]
//! and either continues or stops. Only a failed platform fetch, a prompt
//! failure or unusable answers stop the run; every other failure is logged
//! and the next stage starts.

mod report;
mod stages;

pub use report::{Reporter, RunReport, StageStatus};
pub use stages::remove_builtin_themes;
#[cfg(unix)]
pub use stages::apply_permissions;

use crate::answers::{Prompter, ScaffoldParameters};
use crate::archive::ArchiveFetcher;
use crate::config::ConfigStore;
use crate::error::ScaffoldError;
use crate::profile::PlatformProfile;
use crate::render::TemplateRenderer;
use crate::runtime::{Database, VersionControl};
use crate::services::{Installer, SecretKeySource};
use crate::version::TagSource;
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory inside the project that holds the platform tree
pub const APP_DIR: &str = "app";

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ResolveConfig,
    ResolveVersion,
    CollectAnswers,
    FetchPlatform,
    ReplaceBuiltinThemes,
    FetchTheme,
    FetchBuildTool,
    RenderConfigFiles,
    ProvisionDatabase,
    FinalizeVersionControl,
    SetPermissions,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 12] = [
        Stage::ResolveConfig,
        Stage::ResolveVersion,
        Stage::CollectAnswers,
        Stage::FetchPlatform,
        Stage::ReplaceBuiltinThemes,
        Stage::FetchTheme,
        Stage::FetchBuildTool,
        Stage::RenderConfigFiles,
        Stage::ProvisionDatabase,
        Stage::FinalizeVersionControl,
        Stage::SetPermissions,
        Stage::Report,
    ];

    /// Short human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Stage::ResolveConfig => "Load saved defaults",
            Stage::ResolveVersion => "Check latest release",
            Stage::CollectAnswers => "Project details",
            Stage::FetchPlatform => "Download platform",
            Stage::ReplaceBuiltinThemes => "Remove bundled themes",
            Stage::FetchTheme => "Download starter theme",
            Stage::FetchBuildTool => "Download build tool",
            Stage::RenderConfigFiles => "Write config files",
            Stage::ProvisionDatabase => "Set up database",
            Stage::FinalizeVersionControl => "Initialize git",
            Stage::SetPermissions => "Set permissions",
            Stage::Report => "Summary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a stage produced. Every outcome except `Fatal` carries the stage's
/// value so the run can continue.
#[derive(Debug)]
pub enum StageOutcome<T = ()> {
    Completed(T),
    Skipped(T, &'static str),
    Recovered(T, anyhow::Error),
    Fatal(anyhow::Error),
}

impl StageOutcome<()> {
    pub fn skipped(reason: &'static str) -> Self {
        StageOutcome::Skipped((), reason)
    }

    pub fn recovered(error: anyhow::Error) -> Self {
        StageOutcome::Recovered((), error)
    }

    /// Completed when `result` is Ok, Recovered otherwise
    pub fn from_result(result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => StageOutcome::Completed(()),
            Err(e) => StageOutcome::Recovered((), e),
        }
    }
}

/// Collaborators a run talks to
pub struct Services<'a> {
    pub tags: &'a dyn TagSource,
    pub fetcher: &'a dyn ArchiveFetcher,
    pub renderer: &'a dyn TemplateRenderer,
    pub version_control: &'a dyn VersionControl,
    pub database: &'a dyn Database,
    pub secret_keys: &'a dyn SecretKeySource,
    pub installer: &'a dyn Installer,
}

/// Result of a run that reached the Report stage
#[derive(Debug)]
pub struct ScaffoldRun {
    pub params: ScaffoldParameters,
    pub report: RunReport,
}

/// Runs every stage in order against one project directory
pub struct Orchestrator<'a, C: PlatformProfile> {
    profile: &'a C,
    store: &'a ConfigStore,
    services: Services<'a>,
    prompter: &'a mut dyn Prompter,
    reporter: &'a dyn Reporter,
    project_dir: PathBuf,
    mysql_socket: PathBuf,
}

impl<'a, C: PlatformProfile> Orchestrator<'a, C> {
    pub fn new(
        profile: &'a C,
        store: &'a ConfigStore,
        services: Services<'a>,
        prompter: &'a mut dyn Prompter,
        reporter: &'a dyn Reporter,
        project_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            profile,
            store,
            services,
            prompter,
            reporter,
            project_dir: project_dir.into(),
            mysql_socket: PathBuf::from(profile.local_stack_socket()),
        }
    }

    /// Override the local dev stack's database socket
    pub fn with_mysql_socket(mut self, socket: impl Into<PathBuf>) -> Self {
        self.mysql_socket = socket.into();
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Root of the fetched platform tree
    pub fn app_dir(&self) -> PathBuf {
        self.project_dir.join(APP_DIR)
    }

    /// Run every stage. Returns once Report has run, or at the first fatal
    /// stage.
    pub async fn run(&mut self) -> Result<ScaffoldRun, ScaffoldError> {
        let mut report = RunReport::default();

        self.reporter.stage_started(Stage::ResolveConfig);
        let outcome = self.resolve_config();
        let loaded = self.settle(Stage::ResolveConfig, outcome, &mut report)?;

        self.reporter.stage_started(Stage::ResolveVersion);
        let outcome = self.resolve_version(&loaded).await;
        let version = self.settle(Stage::ResolveVersion, outcome, &mut report)?;

        self.reporter.stage_started(Stage::CollectAnswers);
        let outcome = match self.collect_answers(&loaded, version) {
            Ok(outcome) => outcome,
            Err(e) => {
                let status = StageStatus::Fatal(format!("{:#}", e));
                self.reporter.stage_finished(Stage::CollectAnswers, &status);
                report.record(Stage::CollectAnswers, status);
                return Err(ScaffoldError::Prompt(e));
            }
        };
        let params = self.settle(Stage::CollectAnswers, outcome, &mut report)?;

        self.reporter.stage_started(Stage::FetchPlatform);
        let outcome = self.fetch_platform(&params).await;
        self.settle(Stage::FetchPlatform, outcome, &mut report)?;

        self.reporter.stage_started(Stage::ReplaceBuiltinThemes);
        let outcome = self.replace_builtin_themes();
        self.settle(Stage::ReplaceBuiltinThemes, outcome, &mut report)?;

        self.reporter.stage_started(Stage::FetchTheme);
        let outcome = self.fetch_theme(&params).await;
        self.settle(Stage::FetchTheme, outcome, &mut report)?;

        self.reporter.stage_started(Stage::FetchBuildTool);
        let outcome = self.fetch_build_tool(&params).await;
        self.settle(Stage::FetchBuildTool, outcome, &mut report)?;

        self.reporter.stage_started(Stage::RenderConfigFiles);
        let outcome = self.render_config_files(&params).await;
        self.settle(Stage::RenderConfigFiles, outcome, &mut report)?;

        self.reporter.stage_started(Stage::ProvisionDatabase);
        let outcome = self.provision_database(&params).await;
        self.settle(Stage::ProvisionDatabase, outcome, &mut report)?;

        self.reporter.stage_started(Stage::FinalizeVersionControl);
        let outcome = self.finalize_version_control(&params).await;
        self.settle(Stage::FinalizeVersionControl, outcome, &mut report)?;

        self.reporter.stage_started(Stage::SetPermissions);
        let outcome = self.set_permissions();
        self.settle(Stage::SetPermissions, outcome, &mut report)?;

        self.reporter.stage_started(Stage::Report);
        let steps = self.profile.next_steps(&self.project_dir, &params);
        self.reporter.summary(&report, &steps);
        self.settle(Stage::Report, StageOutcome::Completed(()), &mut report)?;

        Ok(ScaffoldRun { params, report })
    }

    /// Record an outcome and decide whether the run goes on
    fn settle<T>(
        &self,
        stage: Stage,
        outcome: StageOutcome<T>,
        report: &mut RunReport,
    ) -> Result<T, ScaffoldError> {
        let (value, status) = match outcome {
            StageOutcome::Completed(value) => (value, StageStatus::Completed),
            StageOutcome::Skipped(value, reason) => (value, StageStatus::Skipped(reason.to_string())),
            StageOutcome::Recovered(value, error) => {
                (value, StageStatus::Recovered(format!("{:#}", error)))
            }
            StageOutcome::Fatal(error) => {
                let status = StageStatus::Fatal(format!("{:#}", error));
                self.reporter.stage_finished(stage, &status);
                report.record(stage, status);
                return Err(ScaffoldError::Fatal { stage, error });
            }
        };

        self.reporter.stage_finished(stage, &status);
        report.record(stage, status);
        Ok(value)
    }
}
