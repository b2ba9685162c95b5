use super::console::{CliclackPrompter, CliclackReporter};
use crate::archive::HttpArchiveFetcher;
use crate::config::{ConfigStore, Settings};
use crate::pipeline::{Orchestrator, Services};
use crate::profile::PlatformProfile;
use crate::render::MinijinjaRenderer;
use crate::runtime::{
    check_tools, CommandRunner, DependencyInstaller, GitCli, InstallStatus, MysqlCli, Tool,
};
use crate::services::HttpSiteServices;
use crate::version::GitTagSource;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Arguments for a scaffold run
#[derive(Debug, Clone)]
pub struct ScaffoldArgs {
    /// Project directory, created if missing
    pub directory: PathBuf,
    /// Skip `npm install` after scaffolding
    pub skip_install: bool,
}

/// Main entry point for the interactive scaffold
pub async fn run<C: PlatformProfile>(profile: &C, args: ScaffoldArgs) -> Result<()> {
    cliclack::intro(profile.display_name())?;

    let settings = Settings::from_env(profile);
    let project_dir = prepare_directory(&args.directory)?;
    check_runtimes();

    let runner = CommandRunner::new(settings.command_timeout);
    let store = ConfigStore::new(&settings.config_path);
    let tags = GitTagSource::new(profile.upstream_repository(), runner.clone());
    let fetcher = HttpArchiveFetcher::new(profile.user_agent(), settings.fetch_timeout);
    let renderer = MinijinjaRenderer::new()?;
    let git = GitCli::new(runner.clone());
    let database = MysqlCli::new(runner);
    let site = HttpSiteServices::new(
        profile.user_agent(),
        settings.http_timeout,
        profile.secret_key_url(),
        profile.installer_path(),
    );

    let services = Services {
        tags: &tags,
        fetcher: &fetcher,
        renderer: &renderer,
        version_control: &git,
        database: &database,
        secret_keys: &site,
        installer: &site,
    };
    let mut prompter = CliclackPrompter;
    let reporter = CliclackReporter;

    let result = Orchestrator::new(
        profile,
        &store,
        services,
        &mut prompter,
        &reporter,
        &project_dir,
    )
    .with_mysql_socket(&settings.mysql_socket)
    .run()
    .await;

    let scaffold = match result {
        Ok(scaffold) => scaffold,
        Err(e) => {
            cliclack::outro_cancel("Setup stopped.")?;
            return Err(e.into());
        }
    };

    if args.skip_install {
        cliclack::log::info("Skipping dependency installation")?;
    } else {
        // Package installs routinely outlast the command timeout
        let installer = DependencyInstaller::new(CommandRunner::new(settings.fetch_timeout));
        match installer.install(&project_dir).await {
            Ok(InstallStatus::Installed) => cliclack::log::success("Dependencies installed")?,
            Ok(InstallStatus::NotNeeded(reason)) => {
                cliclack::log::info(format!("Skipping dependency installation: {}", reason))?
            }
            Err(e) => cliclack::log::warning(format!("Dependency installation failed: {:#}", e))?,
        }
    }

    let attention = scaffold.report.recovered().count();
    if attention > 0 {
        cliclack::outro(format!(
            "Done, {} step(s) need attention. See {}",
            attention,
            profile.docs_url()
        ))?;
    } else {
        cliclack::outro("Happy coding!")?;
    }

    Ok(())
}

/// Resolve the project directory against the current one and create it
fn prepare_directory(directory: &Path) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let path = if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        current_dir.join(directory)
    };
    cliclack::log::info(format!("Using directory: {}", path.display()))?;

    // Warn if directory exists and has files
    if path.is_dir() {
        let count = std::fs::read_dir(&path)?.count();
        if count > 0 {
            cliclack::log::warning(format!("Directory has {} existing items", count))?;
            let confirm: bool = cliclack::confirm("Continue anyway?")
                .initial_value(false)
                .interact()?;
            if !confirm {
                anyhow::bail!("Setup cancelled.");
            }
        }
    }

    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// Advisory only: the stages that need a tool report its absence themselves
fn check_runtimes() {
    let spinner = cliclack::spinner();
    spinner.start("Checking tools...");

    let tools: Vec<String> = check_tools(&[Tool::Git, Tool::Mysql, Tool::Npm])
        .iter()
        .map(|r| {
            if r.available {
                format!("{} ({})", r.tool, r.version.as_deref().unwrap_or("unknown"))
            } else {
                format!("{} (not installed)", r.tool)
            }
        })
        .collect();
    spinner.stop(format!("Detected tools: {}", tools.join(", ")));
}
