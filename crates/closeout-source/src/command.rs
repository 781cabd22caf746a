//! External-command strategy: an executable (an MCP bridge script, a
//! warehouse CLI) that prints the issue payload as JSON on stdout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use closeout_core::{ConnectionUnavailable, FetchError, IssueRecord, ProjectQuery};
use tokio::process::Command;
use tracing::debug;

use crate::accessor::{Accessor, ConnectionProvider};
use crate::decode::decode_issues;

const STDERR_EXCERPT: usize = 500;

pub struct CommandProvider {
    program: String,
    args: Vec<String>,
    probe_args: Vec<String>,
    timeout: Duration,
}

impl CommandProvider {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        probe_args: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            probe_args,
            timeout,
        }
    }
}

#[async_trait]
impl ConnectionProvider for CommandProvider {
    fn name(&self) -> &str {
        "command"
    }

    async fn connect(&self) -> Result<Box<dyn Accessor>, ConnectionUnavailable> {
        let path = find_program(&self.program).ok_or_else(|| {
            ConnectionUnavailable::new("command", format!("{} not found", self.program))
        })?;
        let label = format!("command:{}", self.program);

        if !self.probe_args.is_empty() {
            debug!(program = %path.display(), "probing command");
            run(&path, &self.probe_args, self.timeout)
                .await
                .map_err(|e| ConnectionUnavailable::new(label.as_str(), e.to_string()))?;
        }

        Ok(Box::new(CommandAccessor {
            label,
            program: path,
            args: self.args.clone(),
            timeout: self.timeout,
        }))
    }
}

pub struct CommandAccessor {
    label: String,
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

#[async_trait]
impl Accessor for CommandAccessor {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, query: &ProjectQuery) -> Result<Vec<IssueRecord>, FetchError> {
        let args = expand_args(&self.args, query);
        let stdout = match run(&self.program, &args, self.timeout).await {
            Ok(out) => out,
            Err(RunError::TimedOut(secs)) => return Err(FetchError::Timeout { secs }),
            Err(RunError::Failed(reason)) => {
                return Err(ConnectionUnavailable::new(self.label.as_str(), reason).into())
            }
        };
        let payload: serde_json::Value = serde_json::from_slice(&stdout)
            .map_err(|e| FetchError::Malformed(format!("stdout is not JSON: {e}")))?;
        decode_issues(payload, query, &self.label)
    }
}

/// Substitute `{project}`, `{status}`, `{limit}`. Without any placeholder the
/// query is appended as `--project P --status S --limit N`.
fn expand_args(template: &[String], query: &ProjectQuery) -> Vec<String> {
    let has_placeholder = template
        .iter()
        .any(|a| a.contains("{project}") || a.contains("{status}") || a.contains("{limit}"));
    if !has_placeholder {
        let mut args = template.to_vec();
        args.extend([
            "--project".to_string(),
            query.project_key.clone(),
            "--status".to_string(),
            query.status_code.clone(),
            "--limit".to_string(),
            query.limit.to_string(),
        ]);
        return args;
    }
    template
        .iter()
        .map(|a| {
            a.replace("{project}", &query.project_key)
                .replace("{status}", &query.status_code)
                .replace("{limit}", &query.limit.to_string())
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("{0}")]
    Failed(String),

    #[error("timed out after {0}s")]
    TimedOut(u64),
}

/// Run to completion and return stdout.
async fn run(program: &Path, args: &[String], timeout: Duration) -> Result<Vec<u8>, RunError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => Ok(output.stdout),
        Ok(Ok(output)) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(RunError::Failed(format!(
                "exit {}: {}",
                output.status.code().unwrap_or(-1),
                excerpt(stderr.trim(), STDERR_EXCERPT)
            )))
        }
        Ok(Err(e)) => Err(RunError::Failed(format!("spawn error: {e}"))),
        Err(_) => Err(RunError::TimedOut(timeout.as_secs())),
    }
}

fn excerpt(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Resolve a program name the way a shell would: paths are taken as-is,
/// bare names are searched on `PATH`.
fn find_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    let as_path = Path::new(program);
    if as_path.components().count() > 1 || as_path.is_absolute() {
        return as_path.is_file().then(|| as_path.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let exe = dir.join(format!("{program}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
