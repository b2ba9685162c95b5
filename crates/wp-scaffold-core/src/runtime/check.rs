//! Detection of the external tools a scaffold run may call

use std::fmt;
use std::process::Command;

/// External tools the pipeline shells out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Git,
    Mysql,
    Npm,
}

impl Tool {
    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Git => "git",
            Tool::Mysql => "MySQL client",
            Tool::Npm => "npm",
        }
    }

    fn program(&self) -> &'static str {
        match self {
            Tool::Git => "git",
            Tool::Mysql => "mysql",
            Tool::Npm => "npm",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Tool detection result
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub tool: Tool,
    pub version: Option<String>,
    pub available: bool,
}

/// Check whether a tool answers `--version`
pub fn check_tool(tool: Tool) -> RuntimeInfo {
    let output = Command::new(tool.program()).arg("--version").output();

    match output {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout)
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            RuntimeInfo {
                tool,
                version: Some(version),
                available: true,
            }
        }
        _ => RuntimeInfo {
            tool,
            version: None,
            available: false,
        },
    }
}

/// Check several tools; missing ones are reported, never fatal
pub fn check_tools(tools: &[Tool]) -> Vec<RuntimeInfo> {
    tools.iter().map(|tool| check_tool(*tool)).collect()
}
