//! Gathering scaffold parameters from prompts
//!
//! This module provides:
//! - Prompt definitions with defaults, validators and transforms
//! - The `Prompter` seam implemented by the interactive UI (and by tests)
//! - `AnswerCollector`, which re-asks a field until its validator passes
//! - `ScaffoldParameters`, the validated record handed to the pipeline

pub mod prompts;
pub mod transform;

use crate::reference;
use crate::version::VersionTag;
use anyhow::Result;
use std::collections::BTreeMap;

pub use prompts::{scaffold_prompts, PromptDefaults};

/// Checks a raw answer; `Err` carries the message shown to the user
pub type Validator = fn(&str) -> std::result::Result<(), String>;

/// Rewrites an accepted answer
pub type Transform = fn(&str) -> String;

/// How a prompt is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Text,
    /// Input is masked
    Secret,
    Confirm { default: bool },
}

/// One parameter prompt
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Stable key the answer is stored under
    pub name: &'static str,
    pub message: String,
    pub kind: PromptKind,
    /// Used when the user submits an empty text answer
    pub default: Option<String>,
    pub validator: Option<Validator>,
    pub transform: Option<Transform>,
}

impl Prompt {
    pub fn text(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
            kind: PromptKind::Text,
            default: None,
            validator: None,
            transform: None,
        }
    }

    pub fn secret(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: PromptKind::Secret,
            ..Self::text(name, message)
        }
    }

    pub fn confirm(name: &'static str, message: impl Into<String>, default: bool) -> Self {
        Self {
            kind: PromptKind::Confirm { default },
            ..Self::text(name, message)
        }
    }

    /// Set the default; empty defaults are treated as none
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.default = (!value.is_empty()).then_some(value);
        self
    }

    pub fn required(mut self) -> Self {
        self.validator = Some(transform::required);
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// A raw answer as returned by a [`Prompter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Flag(bool),
}

/// Presents prompts to the user
pub trait Prompter {
    /// Ask one prompt and return the raw answer
    fn ask(&mut self, prompt: &Prompt) -> Result<Answer>;

    /// Tell the user why an answer was rejected before it is asked again
    fn reject(&mut self, prompt: &Prompt, reason: &str) -> Result<()>;
}

/// Accepted answers keyed by prompt name
#[derive(Debug, Clone, Default)]
pub struct Answers(BTreeMap<&'static str, Answer>);

impl Answers {
    pub fn insert(&mut self, name: &'static str, answer: Answer) {
        self.0.insert(name, answer);
    }

    /// Text answer for a prompt
    pub fn text(&self, name: &str) -> Result<String> {
        match self.0.get(name) {
            Some(Answer::Text(value)) => Ok(value.clone()),
            Some(Answer::Flag(_)) => anyhow::bail!("Answer '{}' is not text", name),
            None => anyhow::bail!("Missing answer '{}'", name),
        }
    }

    /// Yes/no answer for a prompt
    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.0.get(name) {
            Some(Answer::Flag(value)) => Ok(*value),
            Some(Answer::Text(_)) => anyhow::bail!("Answer '{}' is not a flag", name),
            None => anyhow::bail!("Missing answer '{}'", name),
        }
    }
}

/// Runs an ordered prompt list through a [`Prompter`]
pub struct AnswerCollector<'a> {
    prompter: &'a mut dyn Prompter,
}

impl<'a> AnswerCollector<'a> {
    pub fn new(prompter: &'a mut dyn Prompter) -> Self {
        Self { prompter }
    }

    /// Ask every prompt in order. A failed validation re-asks the same
    /// prompt; only prompter I/O errors abort the collection.
    pub fn collect(&mut self, prompts: &[Prompt]) -> Result<Answers> {
        let mut answers = Answers::default();
        for prompt in prompts {
            let answer = self.collect_one(prompt)?;
            answers.insert(prompt.name, answer);
        }
        Ok(answers)
    }

    fn collect_one(&mut self, prompt: &Prompt) -> Result<Answer> {
        loop {
            let raw = match self.prompter.ask(prompt)? {
                Answer::Flag(value) => return Ok(Answer::Flag(value)),
                Answer::Text(value) => value,
            };

            let value = match (&prompt.default, raw.is_empty()) {
                (Some(default), true) => default.clone(),
                _ => raw,
            };

            match Self::accept(prompt, value) {
                Ok(value) => return Ok(Answer::Text(value)),
                Err(reason) => self.prompter.reject(prompt, &reason)?,
            }
        }
    }

    /// Validate, transform, then validate the transformed value as well.
    /// A reference made only of whitespace passes the first check and is
    /// empty after the transform.
    fn accept(prompt: &Prompt, value: String) -> std::result::Result<String, String> {
        if let Some(validate) = prompt.validator {
            validate(&value)?;
        }
        let Some(transform) = prompt.transform else {
            return Ok(value);
        };

        let value = transform(&value);
        if let Some(validate) = prompt.validator {
            validate(&value)?;
        }
        Ok(value)
    }
}

/// Validated parameters for one scaffold run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldParameters {
    /// Site URL with scheme and without trailing slashes
    pub url: String,
    pub db_host: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub table_prefix: String,
    pub platform_version: VersionTag,
    /// Theme reference as the user typed it (after whitespace/case cleanup)
    pub theme_source: String,
    /// Archive locator derived from `theme_source`
    pub theme_locator: String,
    pub theme_name: String,
    /// Build-tool reference as typed; empty when none was given
    pub build_tool_source: String,
    pub build_tool_locator: Option<String>,
    pub author_name: String,
    pub author_uri: String,
    pub site_title: String,
    pub admin_user: String,
    pub admin_password: String,
    pub admin_email: String,
    /// Whether search engines may index the site
    pub public_site: bool,
    pub use_git: bool,
    pub use_local_stack: bool,
}

impl ScaffoldParameters {
    /// Assemble parameters from collected answers, deriving archive locators
    pub fn from_answers(answers: &Answers) -> Result<Self> {
        let theme_source = answers.text(prompts::THEME_SOURCE)?;
        if theme_source.is_empty() {
            anyhow::bail!("A theme source reference is required");
        }
        let theme_locator = reference::normalize(&theme_source);

        let build_tool_source = answers.text(prompts::BUILD_TOOL_SOURCE)?;
        let build_tool_locator =
            (!build_tool_source.is_empty()).then(|| reference::normalize(&build_tool_source));

        Ok(Self {
            url: answers.text(prompts::URL)?,
            db_host: answers.text(prompts::DB_HOST)?,
            db_user: answers.text(prompts::DB_USER)?,
            db_password: answers.text(prompts::DB_PASSWORD)?,
            db_name: answers.text(prompts::DB_NAME)?,
            table_prefix: answers.text(prompts::TABLE_PREFIX)?,
            platform_version: VersionTag::new(answers.text(prompts::PLATFORM_VERSION)?),
            theme_source,
            theme_locator,
            theme_name: answers.text(prompts::THEME_NAME)?,
            build_tool_source,
            build_tool_locator,
            author_name: answers.text(prompts::AUTHOR_NAME)?,
            author_uri: answers.text(prompts::AUTHOR_URI)?,
            site_title: answers.text(prompts::SITE_TITLE)?,
            admin_user: answers.text(prompts::ADMIN_USER)?,
            admin_password: answers.text(prompts::ADMIN_PASSWORD)?,
            admin_email: answers.text(prompts::ADMIN_EMAIL)?,
            public_site: answers.flag(prompts::PUBLIC_SITE)?,
            use_git: answers.flag(prompts::USE_GIT)?,
            use_local_stack: answers.flag(prompts::USE_LOCAL_STACK)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPrompter;

    #[test]
    fn test_empty_required_answer_is_asked_again() {
        let prompts = vec![Prompt::text("dbName", "Database name").required()];
        let mut prompter = ScriptedPrompter::new(&["", "", "demo"]);

        let answers = AnswerCollector::new(&mut prompter)
            .collect(&prompts)
            .unwrap();

        assert_eq!(answers.text("dbName").unwrap(), "demo");
        assert_eq!(prompter.rejections(), &["dbName", "dbName"]);
    }

    #[test]
    fn test_empty_answer_takes_default() {
        let prompts = vec![Prompt::text("dbUser", "Database user").default_value("root")];
        let mut prompter = ScriptedPrompter::new(&[""]);

        let answers = AnswerCollector::new(&mut prompter)
            .collect(&prompts)
            .unwrap();

        assert_eq!(answers.text("dbUser").unwrap(), "root");
    }

    #[test]
    fn test_default_satisfies_required() {
        let prompts = vec![Prompt::text("theme", "Theme")
            .default_value("https://github.com/org/theme")
            .required()];
        let mut prompter = ScriptedPrompter::new(&[""]);

        let answers = AnswerCollector::new(&mut prompter)
            .collect(&prompts)
            .unwrap();

        assert_eq!(answers.text("theme").unwrap(), "https://github.com/org/theme");
        assert!(prompter.rejections().is_empty());
    }

    #[test]
    fn test_transform_runs_after_validation() {
        let prompts = vec![Prompt::text("url", "URL")
            .required()
            .transform(transform::site_url)];
        let mut prompter = ScriptedPrompter::new(&["", "example.com/"]);

        let answers = AnswerCollector::new(&mut prompter)
            .collect(&prompts)
            .unwrap();

        assert_eq!(answers.text("url").unwrap(), "http://example.com");
        assert_eq!(prompter.rejections(), &["url"]);
    }

    #[test]
    fn test_reference_emptied_by_transform_is_asked_again() {
        let prompts = vec![Prompt::text("themeSource", "Theme")
            .required()
            .transform(transform::source_reference)];
        let mut prompter = ScriptedPrompter::new(&["   ", "https://github.com/Org/Theme"]);

        let answers = AnswerCollector::new(&mut prompter)
            .collect(&prompts)
            .unwrap();

        assert_eq!(
            answers.text("themeSource").unwrap(),
            "https://github.com/org/theme"
        );
        assert_eq!(prompter.rejections(), &["themeSource"]);
        assert_eq!(prompter.asked().len(), 2);
    }

    #[test]
    fn test_directory_name_rejects_paths() {
        let prompts = vec![Prompt::text("themeName", "Theme directory")
            .default_value("my-theme")
            .validate(transform::directory_name)];
        let mut prompter = ScriptedPrompter::new(&["../../etc", "/tmp/x", ""]);

        let answers = AnswerCollector::new(&mut prompter)
            .collect(&prompts)
            .unwrap();

        assert_eq!(answers.text("themeName").unwrap(), "my-theme");
        assert_eq!(prompter.rejections(), &["themeName", "themeName"]);
    }

    #[test]
    fn test_confirm_prompts_use_their_default() {
        let prompts = vec![Prompt::confirm("useGit", "Use git?", true)];
        let mut prompter = ScriptedPrompter::new(&[]);

        let answers = AnswerCollector::new(&mut prompter)
            .collect(&prompts)
            .unwrap();

        assert!(answers.flag("useGit").unwrap());
    }

    #[test]
    fn test_answer_type_mismatch_is_an_error() {
        let mut answers = Answers::default();
        answers.insert("useGit", Answer::Flag(true));
        assert!(answers.text("useGit").is_err());
        assert!(answers.flag("missing").is_err());
    }
}
