//! Running external commands with a timeout
//!
//! Every external tool the scaffold touches (git, mysql, npm) goes through
//! [`CommandRunner`] so that none of them can hang a run forever.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command as TokioCommand};
use tokio::time::timeout;

/// Captured output of a successful command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs, killing them when they exceed the timeout
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
    envs: Vec<(String, String)>,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            envs: Vec::new(),
        }
    }

    /// Copy of this runner that also sets an environment variable
    pub fn with_env(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut runner = self.clone();
        runner.envs.push((key.into(), value.into()));
        runner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> TokioCommand {
        let mut command = TokioCommand::new(program);
        command.args(args).kill_on_drop(true);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        command
    }

    /// Run a command and capture its output. A non-zero exit is an error
    /// carrying stderr.
    pub async fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
        let display = format!("{} {}", program, args.join(" "));
        let child = self
            .command(program, args, cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start `{}`", program))?;

        // kill_on_drop takes care of the child when the timeout fires
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.with_context(|| format!("Failed to wait for `{}`", program))?,
            Err(_) => anyhow::bail!(
                "`{}` timed out after {} seconds",
                program,
                self.timeout.as_secs()
            ),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            anyhow::bail!(
                "`{}` failed with exit code {}: {}",
                display,
                output.status.code().unwrap_or(-1),
                if stderr.is_empty() { "no error output" } else { stderr.as_str() }
            );
        }

        Ok(CommandOutput { stdout, stderr })
    }

    /// Start a long-lived command with all three standard streams piped.
    /// The child is killed when dropped.
    pub fn spawn_piped(&self, program: &str, args: &[&str]) -> Result<Child> {
        self.command(program, args, None)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start `{}`", program))
    }

    /// Run a command, streaming its output to the terminal
    pub async fn stream(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<()> {
        let display = format!("{} {}", program, args.join(" "));
        println!();
        println!("{} {}", "Running:".dimmed(), display.yellow());
        println!();

        let mut child = self
            .command(program, args, cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start `{}`", program))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to capture stderr"))?;

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();

        let output_task = async {
            let mut stderr_open = true;
            loop {
                tokio::select! {
                    line = stdout_reader.next_line() => {
                        match line {
                            Ok(Some(line)) => println!("  {}", line),
                            Ok(None) => break,
                            Err(e) => {
                                eprintln!("{} {}", "Error reading stdout:".red(), e);
                                break;
                            }
                        }
                    }
                    line = stderr_reader.next_line(), if stderr_open => {
                        match line {
                            Ok(Some(line)) => eprintln!("  {}", line.yellow()),
                            Ok(None) => stderr_open = false,
                            Err(e) => {
                                eprintln!("{} {}", "Error reading stderr:".red(), e);
                                stderr_open = false;
                            }
                        }
                    }
                }
            }
        };

        if timeout(self.timeout, output_task).await.is_err() {
            let _ = child.kill().await;
            println!();
            anyhow::bail!(
                "`{}` timed out after {} seconds",
                display,
                self.timeout.as_secs()
            );
        }

        match timeout(Duration::from_secs(5), child.wait()).await {
            Ok(Ok(status)) => {
                println!();
                if status.success() {
                    Ok(())
                } else {
                    anyhow::bail!(
                        "`{}` failed with exit code: {}",
                        display,
                        status.code().unwrap_or(-1)
                    );
                }
            }
            Ok(Err(e)) => anyhow::bail!("Failed to wait for `{}`: {}", display, e),
            Err(_) => {
                let _ = child.kill().await;
                anyhow::bail!("`{}` hung after closing its output", display);
            }
        }
    }
}
