//! Test doubles: a platform profile, scripted prompts and recording
//! collaborators that write every call into one shared event log.

use crate::answers::{Answer, Prompt, PromptKind, Prompter, ScaffoldParameters};
use crate::archive::ArchiveFetcher;
use crate::pipeline::{Reporter, RunReport, Services, Stage, StageStatus};
use crate::profile::PlatformProfile;
use crate::render::{RenderContext, TemplateRenderer};
use crate::runtime::{Connection, ConnectionOptions, Database, Rows, VersionControl};
use crate::services::{InstallForm, Installer, SecretKeySource};
use crate::version::{TagSource, VersionTag};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, Default)]
pub struct TestProfile;

impl PlatformProfile for TestProfile {
    fn name(&self) -> &'static str {
        "test-scaffold"
    }

    fn display_name(&self) -> &'static str {
        "TestPress"
    }

    fn upstream_repository(&self) -> &'static str {
        "https://github.com/WordPress/WordPress"
    }

    fn archive_locator(&self, version: &VersionTag) -> String {
        format!(
            "https://github.com/WordPress/WordPress/archive/{}.tar.gz",
            version
        )
    }

    fn content_dir(&self) -> &'static str {
        "wp-content"
    }

    fn themes_dir(&self) -> &'static str {
        "wp-content/themes"
    }

    fn secret_key_url(&self) -> &'static str {
        "https://keys.invalid/salt/"
    }

    fn installer_path(&self) -> &'static str {
        "wp-admin/install.php?step=2"
    }

    fn options_table(&self) -> &'static str {
        "options"
    }

    fn local_stack_socket(&self) -> &'static str {
        "/tmp/test-mysql.sock"
    }

    fn default_theme_name(&self) -> &'static str {
        "my-theme"
    }

    fn default_table_prefix(&self) -> &'static str {
        "wp_"
    }

    fn env_prefix(&self) -> &'static str {
        "TEST_SCAFFOLD"
    }

    fn docs_url(&self) -> &'static str {
        "https://docs.invalid"
    }

    fn next_steps(&self, dir: &Path, params: &ScaffoldParameters) -> Vec<String> {
        vec![
            format!("cd {}", dir.display()),
            format!("open {}", params.url),
        ]
    }
}

/// Parameters matching what the templates and stages expect in tests
pub fn sample_parameters() -> ScaffoldParameters {
    ScaffoldParameters {
        url: "http://myapp.test".to_string(),
        db_host: "localhost".to_string(),
        db_user: "root".to_string(),
        db_password: "root".to_string(),
        db_name: "demo".to_string(),
        table_prefix: "wp_".to_string(),
        platform_version: VersionTag::new("6.4.2"),
        theme_source: "https://github.com/org/theme".to_string(),
        theme_locator: "https://github.com/org/theme/archive/master.tar.gz".to_string(),
        theme_name: "my-theme".to_string(),
        build_tool_source: String::new(),
        build_tool_locator: None,
        author_name: "Ada".to_string(),
        author_uri: "https://ada.example".to_string(),
        site_title: "Demo".to_string(),
        admin_user: "admin".to_string(),
        admin_password: "hunter2".to_string(),
        admin_email: "admin@example.com".to_string(),
        public_site: false,
        use_git: false,
        use_local_stack: false,
    }
}

/// Ordered record of calls made against the doubles
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Events starting with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }

    /// Index of the first event starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.events().iter().position(|e| e.starts_with(prefix))
    }
}

pub struct StaticTags {
    tags: Option<Vec<String>>,
}

impl StaticTags {
    pub fn new(tags: &[&str]) -> Self {
        Self {
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        }
    }

    pub fn failing() -> Self {
        Self { tags: None }
    }
}

#[async_trait]
impl TagSource for StaticTags {
    async fn list_tags(&self) -> Result<Vec<String>> {
        match &self.tags {
            Some(tags) => Ok(tags.clone()),
            None => bail!("upstream unreachable"),
        }
    }
}

/// Answers prompts from a script: per-prompt sequences first, then named
/// answers, then the queue.
/// Text prompts with nothing scripted get an empty answer; confirms get
/// their scripted flag or their default.
#[derive(Default)]
pub struct ScriptedPrompter {
    queue: VecDeque<String>,
    first: HashMap<String, VecDeque<String>>,
    named: HashMap<String, String>,
    flags: HashMap<String, bool>,
    asked: Vec<&'static str>,
    rejections: Vec<&'static str>,
    closed: bool,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            queue: answers.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn named(answers: &[(&str, &str)]) -> Self {
        Self {
            named: answers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_flag(mut self, name: &str, value: bool) -> Self {
        self.flags.insert(name.to_string(), value);
        self
    }

    /// Answers given to `name` before its named answer applies
    pub fn answering_first(mut self, name: &str, answers: &[&str]) -> Self {
        self.first
            .entry(name.to_string())
            .or_default()
            .extend(answers.iter().map(|a| a.to_string()));
        self
    }

    /// Every prompt fails, as when the user cancels the session
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Default::default()
        }
    }

    pub fn asked(&self) -> &[&'static str] {
        &self.asked
    }

    pub fn rejections(&self) -> &[&'static str] {
        &self.rejections
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &Prompt) -> Result<Answer> {
        if self.closed {
            bail!("prompt session closed");
        }
        self.asked.push(prompt.name);
        if self.asked.len() > 500 {
            bail!("script never satisfied prompt '{}'", prompt.name);
        }

        Ok(match prompt.kind {
            PromptKind::Confirm { default } => {
                Answer::Flag(self.flags.get(prompt.name).copied().unwrap_or(default))
            }
            PromptKind::Text | PromptKind::Secret => Answer::Text(
                self.first
                    .get_mut(prompt.name)
                    .and_then(VecDeque::pop_front)
                    .or_else(|| self.named.get(prompt.name).cloned())
                    .or_else(|| self.queue.pop_front())
                    .unwrap_or_default(),
            ),
        })
    }

    fn reject(&mut self, prompt: &Prompt, _reason: &str) -> Result<()> {
        self.rejections.push(prompt.name);
        Ok(())
    }
}

/// Fetcher that lays out a tiny tree instead of downloading. Fetching into
/// an `app` directory produces a platform tree with two bundled themes.
pub struct FakeFetcher {
    log: EventLog,
    failing: Vec<String>,
}

impl FakeFetcher {
    /// Fail every locator containing `needle`
    pub fn fail_on(&mut self, needle: &str) {
        self.failing.push(needle.to_string());
    }
}

#[async_trait]
impl ArchiveFetcher for FakeFetcher {
    async fn fetch(&self, locator: &str, destination: &Path) -> Result<()> {
        self.log.push(format!("fetch {}", locator));
        if self.failing.iter().any(|needle| locator.contains(needle)) {
            bail!("HTTP 404 for {}", locator);
        }

        std::fs::create_dir_all(destination)?;
        if destination.file_name().is_some_and(|name| name == "app") {
            let themes = destination.join("wp-content").join("themes");
            for theme in ["twentytwentythree", "twentytwentyfour"] {
                std::fs::create_dir_all(themes.join(theme))?;
                std::fs::write(themes.join(theme).join("style.css"), "/* bundled */")?;
            }
            std::fs::write(themes.join("index.php"), "<?php // Silence is golden.")?;
            std::fs::write(destination.join("index.php"), "<?php")?;
        } else {
            std::fs::write(destination.join("style.css"), "/* fetched */")?;
        }
        Ok(())
    }
}

pub struct FakeRenderer {
    log: EventLog,
    failing: Vec<&'static str>,
}

impl FakeRenderer {
    pub fn fail_on(&mut self, template: &'static str) {
        self.failing.push(template);
    }
}

impl TemplateRenderer for FakeRenderer {
    fn render(&self, template: &str, destination: &Path, context: &RenderContext) -> Result<()> {
        self.log.push(format!("render {}", template));
        if self.failing.iter().any(|t| *t == template) {
            bail!("template '{}' is broken", template);
        }
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(destination, &context.secret_keys)?;
        Ok(())
    }
}

pub struct FakeGit {
    log: EventLog,
    pub fail_init: bool,
}

#[async_trait]
impl VersionControl for FakeGit {
    async fn init(&self, _path: &Path) -> Result<()> {
        self.log.push("git init");
        if self.fail_init {
            bail!("git is not installed");
        }
        Ok(())
    }

    async fn add(&self, _path: &Path, pattern: &str) -> Result<()> {
        self.log.push(format!("git add {}", pattern));
        Ok(())
    }

    async fn commit(&self, _path: &Path, message: &str) -> Result<()> {
        self.log.push(format!("git commit {}", message));
        Ok(())
    }
}

pub struct FakeDatabase {
    log: EventLog,
    pub fail_connect: bool,
    pub fail_queries: bool,
}

#[async_trait]
impl Database for FakeDatabase {
    async fn connect(&self, options: &ConnectionOptions) -> Result<Box<dyn Connection>> {
        let target = options
            .socket
            .as_ref()
            .map(|s| s.display().to_string())
            .unwrap_or_else(|| options.host.clone());
        self.log.push(format!("db connect {}", target));
        if self.fail_connect {
            bail!("connection refused");
        }
        Ok(Box::new(FakeConnection {
            log: self.log.clone(),
            fail_queries: self.fail_queries,
        }))
    }
}

struct FakeConnection {
    log: EventLog,
    fail_queries: bool,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn query(&mut self, sql: &str) -> Result<Rows> {
        self.log.push(format!("db query {}", sql));
        if self.fail_queries {
            bail!("query failed");
        }
        Ok(Vec::new())
    }

    async fn end(self: Box<Self>) -> Result<()> {
        self.log.push("db end");
        Ok(())
    }
}

pub struct FakeSiteServices {
    log: EventLog,
    pub fail_keys: bool,
    pub fail_install: bool,
    forms: Mutex<Vec<InstallForm>>,
}

impl FakeSiteServices {
    pub fn forms(&self) -> Vec<InstallForm> {
        self.forms.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretKeySource for FakeSiteServices {
    async fn fetch_keys(&self) -> Result<String> {
        self.log.push("keys");
        if self.fail_keys {
            bail!("salt service unavailable");
        }
        Ok("define('AUTH_KEY', 'fetched');".to_string())
    }
}

#[async_trait]
impl Installer for FakeSiteServices {
    async fn install(&self, site_url: &str, form: &InstallForm) -> Result<()> {
        self.log.push(format!("install {}", site_url));
        self.forms.lock().unwrap().push(form.clone());
        if self.fail_install {
            bail!("installer answered HTTP 500");
        }
        Ok(())
    }
}

pub struct RecordingReporter {
    log: EventLog,
    warnings: Mutex<Vec<String>>,
    summaries: Mutex<Vec<(RunReport, Vec<String>)>>,
}

impl RecordingReporter {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<(RunReport, Vec<String>)> {
        self.summaries.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn stage_started(&self, stage: Stage) {
        self.log.push(format!("start {:?}", stage));
    }

    fn stage_finished(&self, stage: Stage, status: &StageStatus) {
        self.log.push(format!("finish {:?} {}", stage, status));
    }

    fn info(&self, _message: &str) {}

    fn warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn summary(&self, report: &RunReport, next_steps: &[String]) {
        self.summaries
            .lock()
            .unwrap()
            .push((report.clone(), next_steps.to_vec()));
    }
}

/// Every recording double, wired to one event log
pub struct Harness {
    pub log: EventLog,
    pub tags: StaticTags,
    pub fetcher: FakeFetcher,
    pub renderer: FakeRenderer,
    pub git: FakeGit,
    pub database: FakeDatabase,
    pub site: FakeSiteServices,
    pub reporter: RecordingReporter,
}

impl Harness {
    pub fn new() -> Self {
        let log = EventLog::default();
        Self {
            tags: StaticTags::new(&["6.3", "6.4.1", "6.4.2"]),
            fetcher: FakeFetcher {
                log: log.clone(),
                failing: Vec::new(),
            },
            renderer: FakeRenderer {
                log: log.clone(),
                failing: Vec::new(),
            },
            git: FakeGit {
                log: log.clone(),
                fail_init: false,
            },
            database: FakeDatabase {
                log: log.clone(),
                fail_connect: false,
                fail_queries: false,
            },
            site: FakeSiteServices {
                log: log.clone(),
                fail_keys: false,
                fail_install: false,
                forms: Mutex::new(Vec::new()),
            },
            reporter: RecordingReporter {
                log: log.clone(),
                warnings: Mutex::new(Vec::new()),
                summaries: Mutex::new(Vec::new()),
            },
            log,
        }
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            tags: &self.tags,
            fetcher: &self.fetcher,
            renderer: &self.renderer,
            version_control: &self.git,
            database: &self.database,
            secret_keys: &self.site,
            installer: &self.site,
        }
    }
}
