//! Validators and value transforms attached to prompts

/// Message shown when a required field is left empty
pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// Reject the empty string, accept anything else
pub fn required(value: &str) -> Result<(), String> {
    if value.is_empty() {
        Err(REQUIRED_MESSAGE.to_string())
    } else {
        Ok(())
    }
}

/// Message shown when a directory name would leave its parent
pub const DIRECTORY_NAME_MESSAGE: &str = "Use a plain directory name, without slashes or \"..\".";

/// Accept a single path component: non-blank, not `.` or `..`, no separators
pub fn directory_name(value: &str) -> Result<(), String> {
    required(value)?;
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || value.contains(|c: char| c == '/' || c == '\\')
    {
        return Err(DIRECTORY_NAME_MESSAGE.to_string());
    }
    Ok(())
}

/// Strip trailing slashes and default the scheme to `http://`
pub fn site_url(value: &str) -> String {
    let trimmed = value.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// Drop all whitespace and lowercase a repository reference
pub fn source_reference(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
