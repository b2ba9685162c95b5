//! Rendering the generated config and build files

use crate::answers::ScaffoldParameters;
use anyhow::{Context, Result};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use std::path::Path;

pub const WP_CONFIG: &str = "wp-config.php";
pub const BUILD_CONFIG: &str = "gulp-config.js";
pub const PACKAGE_JSON: &str = "package.json";
pub const GITIGNORE: &str = "gitignore";
pub const GITATTRIBUTES: &str = "gitattributes";

/// Embedded templates, by name
const TEMPLATES: &[(&str, &str)] = &[
    (WP_CONFIG, include_str!("../templates/wp-config.php")),
    (BUILD_CONFIG, include_str!("../templates/gulp-config.js")),
    (PACKAGE_JSON, include_str!("../templates/package.json")),
    (GITIGNORE, include_str!("../templates/gitignore")),
    (GITATTRIBUTES, include_str!("../templates/gitattributes")),
];

/// Variables available to every template
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    pub project_name: String,
    pub url: String,
    pub site_title: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_host: String,
    pub table_prefix: String,
    /// Salt/key definitions, embedded verbatim
    pub secret_keys: String,
    pub theme_name: String,
    pub themes_dir: String,
    pub content_dir: String,
    /// `Name (uri)` style author string
    pub author: String,
}

impl RenderContext {
    pub fn new(
        project_name: &str,
        params: &ScaffoldParameters,
        secret_keys: String,
        content_dir: &str,
        themes_dir: &str,
    ) -> Self {
        let author = match (params.author_name.is_empty(), params.author_uri.is_empty()) {
            (false, false) => format!("{} ({})", params.author_name, params.author_uri),
            (false, true) => params.author_name.clone(),
            (true, false) => params.author_uri.clone(),
            (true, true) => String::new(),
        };

        Self {
            project_name: package_name(project_name),
            url: params.url.clone(),
            site_title: params.site_title.clone(),
            db_name: params.db_name.clone(),
            db_user: params.db_user.clone(),
            db_password: params.db_password.clone(),
            db_host: params.db_host.clone(),
            table_prefix: params.table_prefix.clone(),
            secret_keys,
            theme_name: params.theme_name.clone(),
            themes_dir: themes_dir.to_string(),
            content_dir: content_dir.to_string(),
            author,
        }
    }
}

/// npm-compatible package name: lowercase, `[a-z0-9-._]` only
fn package_name(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| matches!(c, '-' | '.' | '_'));
    if cleaned.is_empty() {
        "site".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Escape a value for a single-quoted PHP string
fn php_escape(value: String) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Writes a named template to a destination file
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, destination: &Path, context: &RenderContext) -> Result<()>;
}

/// Template renderer using Minijinja
pub struct MinijinjaRenderer {
    env: Environment<'static>,
}

impl MinijinjaRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        // Escaping is explicit per template (`php`, `tojson`)
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("php", php_escape);

        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .with_context(|| format!("Failed to load template '{}'", name))?;
        }

        Ok(Self { env })
    }

    /// Render a template to a string
    pub fn render_to_string(&self, template: &str, context: &RenderContext) -> Result<String> {
        let tmpl = self
            .env
            .get_template(template)
            .with_context(|| format!("Unknown template '{}'", template))?;
        tmpl.render(context)
            .with_context(|| format!("Failed to render template '{}'", template))
    }
}

impl TemplateRenderer for MinijinjaRenderer {
    fn render(&self, template: &str, destination: &Path, context: &RenderContext) -> Result<()> {
        let content = self.render_to_string(template, context)?;
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(destination, content)
            .with_context(|| format!("Failed to write file: {}", destination.display()))
    }
}
