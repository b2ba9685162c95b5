//! Stage bodies

use super::{Orchestrator, StageOutcome};
use crate::answers::prompts::{scaffold_prompts, PromptDefaults};
use crate::answers::{AnswerCollector, ScaffoldParameters};
use crate::config::{LoadedConfig, PartialPersistedConfig};
use crate::profile::PlatformProfile;
use crate::render::{
    RenderContext, BUILD_CONFIG, GITATTRIBUTES, GITIGNORE, PACKAGE_JSON, WP_CONFIG,
};
use crate::runtime::mysql::{activate_theme_sql, create_database_sql};
use crate::runtime::{ConnectionOptions, VersionControl};
use crate::services::{placeholder_keys, InstallForm};
use crate::version::{VersionResolver, VersionTag};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

impl<'a, C: PlatformProfile> Orchestrator<'a, C> {
    pub(super) fn resolve_config(&self) -> StageOutcome<LoadedConfig> {
        let loaded = self.store.load();
        let path = self.store.path();

        if loaded.found {
            self.reporter
                .info(&format!("Using saved defaults from {}", path.display()));
        } else if path.exists() {
            return StageOutcome::Recovered(
                loaded,
                anyhow::anyhow!(
                    "Could not read {}, continuing without saved defaults",
                    path.display()
                ),
            );
        } else {
            self.reporter.info(&format!(
                "No saved defaults yet, your answers will be saved to {}",
                path.display()
            ));
        }
        StageOutcome::Completed(loaded)
    }

    pub(super) async fn resolve_version(&self, loaded: &LoadedConfig) -> StageOutcome<VersionTag> {
        let resolver = VersionResolver::new(self.services.tags, self.store);
        let resolution = resolver
            .resolve(loaded.data.latest_known_version.as_ref())
            .await;

        if resolution.updated {
            self.reporter.info(&format!(
                "New {} release found: {}",
                self.profile.display_name(),
                resolution.version
            ));
        }

        match resolution.failure {
            Some(e) => StageOutcome::Recovered(
                resolution.version,
                e.context("Could not determine the latest release"),
            ),
            None => StageOutcome::Completed(resolution.version),
        }
    }

    /// Ask every prompt. An `Err` means the prompt session itself failed.
    pub(super) fn collect_answers(
        &mut self,
        loaded: &LoadedConfig,
        version: VersionTag,
    ) -> Result<StageOutcome<ScaffoldParameters>> {
        let defaults = PromptDefaults {
            persisted: loaded.data.clone(),
            version: Some(version.clone()),
        };
        let prompts = scaffold_prompts(self.profile, &defaults);
        let answers = AnswerCollector::new(&mut *self.prompter).collect(&prompts)?;

        let params = match ScaffoldParameters::from_answers(&answers) {
            Ok(params) => params,
            Err(e) => return Ok(StageOutcome::Fatal(e)),
        };

        if loaded.found {
            return Ok(StageOutcome::Completed(params));
        }

        let values = PartialPersistedConfig {
            author_name: params.author_name.clone(),
            author_uri: params.author_uri.clone(),
            theme_url: params.theme_source.clone(),
            build_tool_url: params.build_tool_source.clone(),
            latest_known_version: (!version.is_unknown()).then_some(version),
        };
        Ok(match self.store.create(values) {
            Ok(()) => {
                self.reporter.info(&format!(
                    "Saved your defaults to {}",
                    self.store.path().display()
                ));
                StageOutcome::Completed(params)
            }
            Err(e) => StageOutcome::Recovered(params, e.context("Could not save your defaults")),
        })
    }

    pub(super) async fn fetch_platform(&self, params: &ScaffoldParameters) -> StageOutcome {
        let locator = self.profile.archive_locator(&params.platform_version);
        self.reporter.info(&format!(
            "Downloading {} {}",
            self.profile.display_name(),
            params.platform_version
        ));

        match self.services.fetcher.fetch(&locator, &self.app_dir()).await {
            Ok(()) => StageOutcome::Completed(()),
            Err(e) => StageOutcome::Fatal(e.context(format!(
                "Could not download {} {}",
                self.profile.display_name(),
                params.platform_version
            ))),
        }
    }

    pub(super) fn replace_builtin_themes(&self) -> StageOutcome {
        let themes_dir = self.app_dir().join(self.profile.themes_dir());
        match remove_builtin_themes(&themes_dir) {
            Ok(removed) => {
                for path in removed {
                    self.reporter.info(&format!("Removed {}", path.display()));
                }
                StageOutcome::Completed(())
            }
            Err(e) => StageOutcome::recovered(e),
        }
    }

    pub(super) async fn fetch_theme(&self, params: &ScaffoldParameters) -> StageOutcome {
        let destination = self
            .app_dir()
            .join(self.profile.themes_dir())
            .join(&params.theme_name);
        self.reporter
            .info(&format!("Downloading theme from {}", params.theme_locator));

        let result = self
            .services
            .fetcher
            .fetch(&params.theme_locator, &destination)
            .await
            .with_context(|| format!("Could not download the theme from {}", params.theme_locator));
        StageOutcome::from_result(result)
    }

    pub(super) async fn fetch_build_tool(&self, params: &ScaffoldParameters) -> StageOutcome {
        let Some(locator) = &params.build_tool_locator else {
            return StageOutcome::skipped("no build tool given");
        };
        self.reporter
            .info(&format!("Downloading build tool from {}", locator));

        let result = self
            .services
            .fetcher
            .fetch(locator, &self.project_dir)
            .await
            .with_context(|| format!("Could not download the build tool from {}", locator));
        StageOutcome::from_result(result)
    }

    pub(super) async fn render_config_files(&self, params: &ScaffoldParameters) -> StageOutcome {
        let mut failure = None;
        let secret_keys = match self.services.secret_keys.fetch_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                self.reporter
                    .warning("Could not fetch secret keys, writing placeholders instead");
                failure = Some(e.context("Could not fetch secret keys"));
                placeholder_keys()
            }
        };

        let project_name = self
            .project_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let context = RenderContext::new(
            &project_name,
            params,
            secret_keys,
            self.profile.content_dir(),
            self.profile.themes_dir(),
        );

        let app = self.app_dir();
        let root = &self.project_dir;
        let targets = [
            (WP_CONFIG, app.join("wp-config.php")),
            (BUILD_CONFIG, root.join("gulp-config.js")),
            (PACKAGE_JSON, root.join("package.json")),
            (GITIGNORE, root.join(".gitignore")),
            (GITATTRIBUTES, root.join(".gitattributes")),
        ];

        for (template, destination) in targets {
            // The build tool may ship its own manifest
            if template == PACKAGE_JSON && destination.exists() {
                self.reporter.info("Keeping package.json from the build tool");
                continue;
            }

            if let Err(e) = self.services.renderer.render(template, &destination, &context) {
                let e = e.context(format!("Could not write {}", destination.display()));
                match failure {
                    None => failure = Some(e),
                    Some(_) => self.reporter.warning(&format!("{:#}", e)),
                }
            }
        }

        match failure {
            Some(e) => StageOutcome::recovered(e),
            None => StageOutcome::Completed(()),
        }
    }

    pub(super) async fn provision_database(&self, params: &ScaffoldParameters) -> StageOutcome {
        if !params.use_local_stack {
            return StageOutcome::skipped("local dev stack not requested");
        }

        let options = ConnectionOptions {
            host: params.db_host.clone(),
            user: params.db_user.clone(),
            password: params.db_password.clone(),
            socket: Some(self.mysql_socket.clone()),
        };
        let mut connection = match self.services.database.connect(&options).await {
            Ok(connection) => connection,
            Err(e) => {
                return StageOutcome::recovered(e.context(format!(
                    "Could not connect to the database at {}",
                    self.mysql_socket.display()
                )))
            }
        };

        let mut failures = Vec::new();

        match connection.query(&create_database_sql(&params.db_name)).await {
            Ok(_) => self
                .reporter
                .info(&format!("Database {} is ready", params.db_name)),
            Err(e) => failures.push(e.context("Could not create the database")),
        }

        let form = InstallForm {
            site_title: params.site_title.clone(),
            admin_user: params.admin_user.clone(),
            admin_password: params.admin_password.clone(),
            admin_email: params.admin_email.clone(),
            public_site: params.public_site,
        };
        if let Err(e) = self.services.installer.install(&params.url, &form).await {
            failures.push(e.context(format!("Could not install {}", self.profile.display_name())));
        }

        let options_table = format!("{}{}", params.table_prefix, self.profile.options_table());
        let activate = activate_theme_sql(&params.db_name, &options_table, &params.theme_name);
        if let Err(e) = connection.query(&activate).await {
            failures.push(e.context("Could not activate the theme"));
        }

        if let Err(e) = connection.end().await {
            failures.push(e.context("Could not close the database connection"));
        }

        let mut failures = failures.into_iter();
        match failures.next() {
            None => StageOutcome::Completed(()),
            Some(first) => {
                for other in failures {
                    self.reporter.warning(&format!("{:#}", other));
                }
                StageOutcome::recovered(first)
            }
        }
    }

    pub(super) async fn finalize_version_control(&self, params: &ScaffoldParameters) -> StageOutcome {
        if !params.use_git {
            return StageOutcome::skipped("git not requested");
        }

        let result = initial_commit(self.services.version_control, &self.project_dir)
            .await
            .context("Could not create the initial commit");
        StageOutcome::from_result(result)
    }

    #[cfg(unix)]
    pub(super) fn set_permissions(&self) -> StageOutcome {
        let content_dir = self.app_dir().join(self.profile.content_dir());
        match apply_permissions(&content_dir) {
            Ok(count) => {
                self.reporter.info(&format!(
                    "Updated permissions on {} entries under {}",
                    count,
                    content_dir.display()
                ));
                StageOutcome::Completed(())
            }
            Err(e) => StageOutcome::recovered(e),
        }
    }

    #[cfg(not(unix))]
    pub(super) fn set_permissions(&self) -> StageOutcome {
        StageOutcome::skipped("permissions are only set on unix")
    }
}

async fn initial_commit(vcs: &dyn VersionControl, dir: &Path) -> Result<()> {
    vcs.init(dir).await?;
    vcs.add(dir, ".").await?;
    vcs.commit(dir, "Initial commit").await
}

/// Delete every directory directly under `themes_dir`. Files are left alone.
pub fn remove_builtin_themes(themes_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(themes_dir)
        .with_context(|| format!("Failed to read themes directory: {}", themes_dir.display()))?;

    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let path = entry.path();
        std::fs::remove_dir_all(&path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        removed.push(path);
    }
    Ok(removed)
}

/// Make the content directory group-writable: directories 0775, files 0664.
/// Creates `uploads` first. Returns how many entries were updated.
#[cfg(unix)]
pub fn apply_permissions(content_dir: &Path) -> Result<usize> {
    use std::os::unix::fs::PermissionsExt;
    use walkdir::WalkDir;

    let uploads = content_dir.join("uploads");
    std::fs::create_dir_all(&uploads)
        .with_context(|| format!("Failed to create directory: {}", uploads.display()))?;

    let mut count = 0;
    for entry in WalkDir::new(content_dir) {
        let entry =
            entry.with_context(|| format!("Failed to walk {}", content_dir.display()))?;
        if entry.path_is_symlink() {
            continue;
        }
        let mode = if entry.file_type().is_dir() { 0o775 } else { 0o664 };
        std::fs::set_permissions(entry.path(), std::fs::Permissions::from_mode(mode))
            .with_context(|| format!("Failed to set permissions on {}", entry.path().display()))?;
        count += 1;
    }
    Ok(count)
}
