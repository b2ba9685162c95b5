//! Relational database driver backed by the `mysql` client

use super::command::CommandRunner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::time::timeout;

/// Rows returned by a query, one string per column
pub type Rows = Vec<Vec<String>>;

/// How to reach the database server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub host: String,
    pub user: String,
    pub password: String,
    /// Unix socket; takes precedence over `host` when set
    pub socket: Option<PathBuf>,
}

/// Opens database sessions
#[async_trait]
pub trait Database: Send + Sync {
    async fn connect(&self, options: &ConnectionOptions) -> Result<Box<dyn Connection>>;
}

/// An open database session
#[async_trait]
pub trait Connection: Send {
    async fn query(&mut self, sql: &str) -> Result<Rows>;

    /// Close the session
    async fn end(self: Box<Self>) -> Result<()>;
}

/// Quote an identifier with backticks
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a string literal with single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// `CREATE DATABASE IF NOT EXISTS` for the project database
pub fn create_database_sql(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", quote_identifier(database))
}

/// Point the active template and stylesheet at the new theme directory
pub fn activate_theme_sql(database: &str, options_table: &str, theme_name: &str) -> String {
    format!(
        "UPDATE {}.{} SET option_value = {} WHERE option_name IN ('template', 'stylesheet')",
        quote_identifier(database),
        quote_identifier(options_table),
        quote_literal(theme_name)
    )
}

/// Line the client prints after each statement's rows
const END_OF_RESULT: &str = "__wp_scaffold_end_of_result__";

/// Talks to the server through one `mysql` command-line client per session
pub struct MysqlCli {
    runner: CommandRunner,
    program: Vec<String>,
}

impl MysqlCli {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            runner,
            program: vec!["mysql".to_string()],
        }
    }

    /// Use another client command line, e.g. an interpreter plus a script
    pub fn with_program(mut self, program: &[&str]) -> Self {
        self.program = program.iter().map(|part| part.to_string()).collect();
        self
    }
}

#[async_trait]
impl Database for MysqlCli {
    async fn connect(&self, options: &ConnectionOptions) -> Result<Box<dyn Connection>> {
        let (program, leading) = self
            .program
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("No database client configured"))?;
        let connection = connection_args(options);
        let args: Vec<&str> = leading
            .iter()
            .chain(connection.iter())
            .map(String::as_str)
            .collect();

        // The password travels in the environment, never on the command line
        let mut child = self
            .runner
            .with_env("MYSQL_PWD", options.password.clone())
            .spawn_piped(program, &args)?;
        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to capture database client output"))?;

        let mut session = MysqlSession {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            timeout: self.runner.timeout(),
        };
        session
            .query("SELECT 1")
            .await
            .context("Failed to connect to the database server")?;
        Ok(Box::new(session))
    }
}

fn connection_args(options: &ConnectionOptions) -> Vec<String> {
    let mut args = vec![
        "--batch".to_string(),
        "--skip-column-names".to_string(),
        "--unbuffered".to_string(),
        format!("--user={}", options.user),
    ];
    match &options.socket {
        Some(socket) => args.push(format!("--socket={}", socket.display())),
        None => args.push(format!("--host={}", options.host)),
    }
    args
}

/// One client process holding one server connection. Statements go in on
/// stdin; each is followed by a marker select so its rows can be told apart.
/// The client exits on the first failed statement, which closes the session.
struct MysqlSession {
    child: Child,
    /// `None` once the session is closed
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
    timeout: Duration,
}

impl MysqlSession {
    /// Error output of a client that has exited
    async fn client_error(&mut self) -> String {
        let mut message = String::new();
        if let Some(mut stderr) = self.child.stderr.take() {
            let _ = timeout(self.timeout, stderr.read_to_string(&mut message)).await;
        }
        match message.trim() {
            "" => "the database client exited".to_string(),
            trimmed => trimmed.to_string(),
        }
    }
}

#[async_trait]
impl Connection for MysqlSession {
    async fn query(&mut self, sql: &str) -> Result<Rows> {
        let Some(stdin) = self.stdin.as_mut() else {
            anyhow::bail!("The database session is closed");
        };
        let script = format!(
            "{};\nSELECT '{}';\n",
            sql.trim().trim_end_matches(';'),
            END_OF_RESULT
        );
        let stdout = &mut self.stdout;

        let exchange = async {
            stdin.write_all(script.as_bytes()).await?;
            stdin.flush().await?;

            let mut lines = Vec::new();
            while let Some(line) = stdout.next_line().await? {
                if line == END_OF_RESULT {
                    return Ok(Some(lines));
                }
                lines.push(line);
            }
            Ok::<_, std::io::Error>(None)
        };

        let outcome = timeout(self.timeout, exchange).await;
        match outcome {
            Ok(Ok(Some(lines))) => Ok(parse_rows(&lines.join("\n"))),
            Ok(result) => {
                self.stdin = None;
                let message = self.client_error().await;
                match result {
                    Err(e) => Err(anyhow::Error::new(e).context(message)),
                    Ok(_) => Err(anyhow::anyhow!(message)),
                }
            }
            Err(_) => {
                self.stdin = None;
                let _ = self.child.kill().await;
                anyhow::bail!(
                    "Database statement timed out after {} seconds",
                    self.timeout.as_secs()
                )
            }
        }
    }

    async fn end(mut self: Box<Self>) -> Result<()> {
        let closed_cleanly = self.stdin.is_some();
        // End of input makes the client disconnect and exit
        drop(self.stdin.take());

        match timeout(self.timeout, self.child.wait()).await {
            Ok(status) => {
                let status = status.context("Failed to wait for the database client")?;
                if closed_cleanly && !status.success() {
                    anyhow::bail!(
                        "The database client exited with code {}",
                        status.code().unwrap_or(-1)
                    );
                }
                Ok(())
            }
            Err(_) => {
                let _ = self.child.kill().await;
                anyhow::bail!("The database client did not exit after the session ended")
            }
        }
    }
}

/// Parse `--batch` output (tab-separated columns, one row per line)
fn parse_rows(stdout: &str) -> Rows {
    stdout
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}
