//! HTTP services used while configuring the site: the secret-key generator
//! and the platform's installer endpoint

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Key names expected in the generated config, in order
const KEY_NAMES: &[&str] = &[
    "AUTH_KEY",
    "SECURE_AUTH_KEY",
    "LOGGED_IN_KEY",
    "NONCE_KEY",
    "AUTH_SALT",
    "SECURE_AUTH_SALT",
    "LOGGED_IN_SALT",
    "NONCE_SALT",
];

/// Key block used when the secret-key service cannot be reached
pub fn placeholder_keys() -> String {
    KEY_NAMES
        .iter()
        .map(|name| format!("define('{}', 'put your unique phrase here');", name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Admin bootstrap fields posted to the installer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallForm {
    pub site_title: String,
    pub admin_user: String,
    pub admin_password: String,
    pub admin_email: String,
    pub public_site: bool,
}

impl InstallForm {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("weblog_title", self.site_title.clone()),
            ("user_name", self.admin_user.clone()),
            ("admin_password", self.admin_password.clone()),
            ("admin_password2", self.admin_password.clone()),
            ("admin_email", self.admin_email.clone()),
            ("blog_public", if self.public_site { "1" } else { "0" }.to_string()),
        ]
    }
}

/// Source of salt/key definitions for the generated config
#[async_trait]
pub trait SecretKeySource: Send + Sync {
    /// Newline-delimited key definitions, used verbatim
    async fn fetch_keys(&self) -> Result<String>;
}

/// The fetched platform's installer endpoint
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, site_url: &str, form: &InstallForm) -> Result<()>;
}

/// reqwest-backed implementation of both site services
pub struct HttpSiteServices {
    client: reqwest::Client,
    secret_key_url: String,
    installer_path: String,
}

impl HttpSiteServices {
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        secret_key_url: impl Into<String>,
        installer_path: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            secret_key_url: secret_key_url.into(),
            installer_path: installer_path.into(),
        }
    }

    /// `<site url>/<installer path>`
    fn installer_url(&self, site_url: &str) -> Result<Url> {
        let base = format!("{}/", site_url.trim_end_matches('/'));
        let base = Url::parse(&base).with_context(|| format!("Invalid site URL: {}", site_url))?;
        base.join(&self.installer_path)
            .with_context(|| format!("Invalid installer path: {}", self.installer_path))
    }
}

#[async_trait]
impl SecretKeySource for HttpSiteServices {
    async fn fetch_keys(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.secret_key_url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch secret keys from {}", self.secret_key_url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch secret keys from {}: HTTP {}",
                self.secret_key_url,
                response.status()
            );
        }

        let keys = response.text().await?;
        if keys.trim().is_empty() {
            anyhow::bail!("Secret key service returned an empty response");
        }
        Ok(keys.trim_end().to_string())
    }
}

#[async_trait]
impl Installer for HttpSiteServices {
    async fn install(&self, site_url: &str, form: &InstallForm) -> Result<()> {
        let url = self.installer_url(site_url)?;
        let response = self
            .client
            .post(url.clone())
            .form(&form.fields())
            .send()
            .await
            .with_context(|| format!("Failed to reach the installer at {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Installer at {} answered HTTP {}", url, response.status());
        }
        Ok(())
    }
}
