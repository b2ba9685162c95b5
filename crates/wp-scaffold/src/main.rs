//! WP Scaffold - Bootstraps WordPress projects with a starter theme and build tool

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use wp_scaffold_core::{PlatformProfile, ScaffoldArgs, ScaffoldParameters, VersionTag};

/// WordPress platform profile
#[derive(Clone)]
pub struct WordPressProfile;

impl PlatformProfile for WordPressProfile {
    fn name(&self) -> &'static str {
        "wp-scaffold"
    }

    fn display_name(&self) -> &'static str {
        "WordPress"
    }

    fn upstream_repository(&self) -> &'static str {
        "https://github.com/WordPress/WordPress.git"
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
        "https://api.wordpress.org/secret-key/1.1/salt/"
    }

    fn installer_path(&self) -> &'static str {
        "wp-admin/install.php?step=2"
    }

    fn options_table(&self) -> &'static str {
        "options"
    }

    fn local_stack_socket(&self) -> &'static str {
        "/Applications/MAMP/tmp/mysql/mysql.sock"
    }

    fn default_theme_name(&self) -> &'static str {
        "starter-theme"
    }

    fn default_table_prefix(&self) -> &'static str {
        "wp_"
    }

    fn env_prefix(&self) -> &'static str {
        "WP_SCAFFOLD"
    }

    fn docs_url(&self) -> &'static str {
        "https://developer.wordpress.org/themes/"
    }

    fn next_steps(&self, dir: &Path, params: &ScaffoldParameters) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        if current.as_deref() != Some(dir) {
            steps.push(format!("cd {}", dir.display()));
        }

        // Without the local stack nothing created the database or ran the installer
        if !params.use_local_stack {
            steps.push(format!(
                "Create the `{}` database and serve {} at {}",
                params.db_name,
                dir.join("app").display(),
                params.url
            ));
            steps.push(format!("Finish the install at {}/wp-admin/install.php", params.url));
        }

        if params.build_tool_locator.is_some() {
            steps.push("npm run watch".to_string());
        }

        steps.push(format!(
            "Start building in app/{}/{}",
            self.themes_dir(),
            params.theme_name
        ));

        steps
    }
}

#[derive(Parser, Debug)]
#[command(name = "wp-scaffold")]
#[command(about = "CLI for bootstrapping WordPress projects with a starter theme and build tool")]
#[command(version)]
pub struct Args {
    /// Project directory to create
    pub directory: PathBuf,

    /// Skip installing npm dependencies after scaffolding
    #[arg(long = "skip-install")]
    pub skip_install: bool,
}

impl From<Args> for ScaffoldArgs {
    fn from(args: Args) -> Self {
        ScaffoldArgs {
            directory: args.directory,
            skip_install: args.skip_install,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    let profile = WordPressProfile;

    let result = wp_scaffold_core::run(&profile, args.into()).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}
