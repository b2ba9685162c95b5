//! The ordered prompt list for a scaffold run

use super::{transform, Prompt};
use crate::config::PersistedConfig;
use crate::profile::PlatformProfile;
use crate::version::VersionTag;

pub const URL: &str = "url";
pub const DB_NAME: &str = "dbName";
pub const DB_HOST: &str = "dbHost";
pub const DB_USER: &str = "dbUser";
pub const DB_PASSWORD: &str = "dbPassword";
pub const TABLE_PREFIX: &str = "tablePrefix";
pub const PLATFORM_VERSION: &str = "platformVersion";
pub const THEME_SOURCE: &str = "themeSource";
pub const THEME_NAME: &str = "themeName";
pub const BUILD_TOOL_SOURCE: &str = "buildToolSource";
pub const AUTHOR_NAME: &str = "authorName";
pub const AUTHOR_URI: &str = "authorURI";
pub const SITE_TITLE: &str = "siteTitle";
pub const ADMIN_USER: &str = "adminUser";
pub const ADMIN_PASSWORD: &str = "adminPassword";
pub const ADMIN_EMAIL: &str = "adminEmail";
pub const PUBLIC_SITE: &str = "publicSite";
pub const USE_GIT: &str = "useGit";
pub const USE_LOCAL_STACK: &str = "useLocalStack";

/// Defaults offered by the prompts, gathered before collection starts
#[derive(Debug, Clone, Default)]
pub struct PromptDefaults {
    pub persisted: PersistedConfig,
    pub version: Option<VersionTag>,
}

/// Build the prompt list in presentation order
pub fn scaffold_prompts<C: PlatformProfile>(profile: &C, defaults: &PromptDefaults) -> Vec<Prompt> {
    let platform = profile.display_name();
    let version = defaults
        .version
        .as_ref()
        .filter(|v| !v.is_unknown())
        .map(|v| v.to_string())
        .unwrap_or_default();

    vec![
        Prompt::text(URL, format!("{} URL", platform))
            .required()
            .transform(transform::site_url),
        Prompt::text(DB_NAME, "Database name").required(),
        Prompt::text(DB_HOST, "Database host").default_value("localhost"),
        Prompt::text(DB_USER, "Database user").default_value("root"),
        Prompt::text(DB_PASSWORD, "Database password").default_value("root"),
        Prompt::text(TABLE_PREFIX, "Database table prefix")
            .default_value(profile.default_table_prefix()),
        Prompt::text(
            PLATFORM_VERSION,
            format!("Which version of {} do you want?", platform),
        )
        .default_value(version)
        .required(),
        Prompt::text(THEME_SOURCE, "Starter theme (please provide a github link)")
            .default_value(defaults.persisted.theme_url.clone())
            .required()
            .transform(transform::source_reference),
        Prompt::text(THEME_NAME, "What should the theme directory be named?")
            .default_value(profile.default_theme_name())
            .validate(transform::directory_name),
        Prompt::text(
            BUILD_TOOL_SOURCE,
            "Build tool (github link, leave empty to skip)",
        )
        .default_value(defaults.persisted.build_tool_url.clone())
        .transform(transform::source_reference),
        Prompt::text(AUTHOR_NAME, "Author name")
            .default_value(defaults.persisted.author_name.clone()),
        Prompt::text(AUTHOR_URI, "Author URI").default_value(defaults.persisted.author_uri.clone()),
        Prompt::text(SITE_TITLE, "Site title").required(),
        Prompt::text(ADMIN_USER, "Admin username").required(),
        Prompt::secret(ADMIN_PASSWORD, "Admin password").required(),
        Prompt::text(ADMIN_EMAIL, "Admin email").required(),
        Prompt::confirm(
            PUBLIC_SITE,
            "Allow search engines to index this site?",
            false,
        ),
        Prompt::confirm(USE_GIT, "Initialize a git repository?", true),
        Prompt::confirm(
            USE_LOCAL_STACK,
            "Provision the database on the local dev stack?",
            false,
        ),
    ]
}
