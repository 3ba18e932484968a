//! External process invocation: build/test scripts and repository cloning.
//!
//! Collaborator processes are opaque: callsift cares about the exit code and
//! the captured output, nothing else. Timeouts and missing binaries fold into
//! an exit code of -1 with the reason in stderr, so callers handle every
//! failure mode through the same triple.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{error, info};

use crate::core::errors::{CallsiftError, Result};

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code; -1 when the process never produced one
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    fn failed(message: String) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: message,
        }
    }
}

/// Runs external commands with a working directory and a timeout.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    command_timeout: Duration,
}

impl CommandRunner {
    /// Create a runner with a per-command timeout.
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            command_timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Run a command to completion, capturing output.
    pub async fn run(&self, program: &str, args: &[&str], cwd: &Path) -> CommandOutput {
        let future = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .kill_on_drop(true)
            .output();

        let output = match timeout(self.command_timeout, future).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                let message = if err.kind() == std::io::ErrorKind::NotFound {
                    format!("Command not found: {program}")
                } else {
                    format!("Error running command: {err}")
                };
                error!("{message}");
                return CommandOutput::failed(message);
            }
            Err(_) => {
                let message = format!(
                    "Command timed out after {} seconds",
                    self.command_timeout.as_secs()
                );
                error!("{message}");
                return CommandOutput::failed(message);
            }
        };

        CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Clone a repository into `clones_dir`, skipping an existing checkout.
    pub async fn clone_repository(&self, clones_dir: &Path, full_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(clones_dir).map_err(|e| {
            CallsiftError::io(
                format!("Failed to create clones dir {}", clones_dir.display()),
                e,
            )
        })?;

        let repo_dir_name = full_name.rsplit('/').next().unwrap_or(full_name);
        let repo_path = clones_dir.join(repo_dir_name);

        if repo_path.exists() {
            info!(repo = full_name, "checkout already exists at {}", repo_path.display());
            return Ok(repo_path);
        }

        let url = format!("https://github.com/{full_name}.git");
        info!(repo = full_name, "cloning into {}", repo_path.display());
        let output = self
            .run(
                "git",
                &["clone", &url, &repo_path.to_string_lossy()],
                clones_dir,
            )
            .await;

        if !output.success() {
            return Err(CallsiftError::subprocess(
                format!("git clone {url}"),
                format!("exit code {}: {}", output.exit_code, output.stderr.trim()),
            ));
        }

        Ok(repo_path)
    }
}

/// Write a command transcript (exit code, stdout, stderr) to the logs dir.
pub fn write_transcript(logs_dir: &Path, name: &str, output: &CommandOutput) -> Result<PathBuf> {
    std::fs::create_dir_all(logs_dir).map_err(|e| {
        CallsiftError::io(format!("Failed to create logs dir {}", logs_dir.display()), e)
    })?;

    let path = logs_dir.join(format!("{name}.log"));
    let body = format!(
        "Exit Code: {}\n\nSTDOUT:\n{}\n\nSTDERR:\n{}\n",
        output.exit_code, output.stdout, output.stderr
    );
    std::fs::write(&path, body).map_err(|e| {
        CallsiftError::io(format!("Failed to write transcript {}", path.display()), e)
    })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_exit_code_and_stdout() {
        let runner = CommandRunner::new(30);
        let dir = tempfile::tempdir().unwrap();

        let output = runner.run("sh", &["-c", "printf hello"], dir.path()).await;
        assert_eq!(output.exit_code, 0);
        assert!(output.success());
        assert_eq!(output.stdout, "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported() {
        let runner = CommandRunner::new(30);
        let dir = tempfile::tempdir().unwrap();

        let output = runner.run("sh", &["-c", "exit 3"], dir.path()).await;
        assert_eq!(output.exit_code, 3);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn missing_binary_folds_into_failure_output() {
        let runner = CommandRunner::new(30);
        let dir = tempfile::tempdir().unwrap();

        let output = runner.run("callsift-no-such-binary", &[], dir.path()).await;
        assert_eq!(output.exit_code, -1);
        assert!(output.stderr.contains("Command not found"));
    }

    #[tokio::test]
    async fn timeout_folds_into_failure_output() {
        let runner = CommandRunner::new(1);
        let dir = tempfile::tempdir().unwrap();

        let output = runner.run("sh", &["-c", "sleep 5"], dir.path()).await;
        assert_eq!(output.exit_code, -1);
        assert!(output.stderr.contains("timed out"));
    }

    #[tokio::test]
    async fn existing_checkout_is_not_recloned() {
        let runner = CommandRunner::new(30);
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("abp")).unwrap();

        let path = runner
            .clone_repository(dir.path(), "abpframework/abp")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("abp"));
    }

    #[test]
    fn transcript_contains_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let output = CommandOutput {
            exit_code: 2,
            stdout: "built".to_string(),
            stderr: "warned".to_string(),
        };

        let path = write_transcript(dir.path(), "build", &output).unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.contains("Exit Code: 2"));
        assert!(body.contains("STDOUT:\nbuilt"));
        assert!(body.contains("STDERR:\nwarned"));
    }
}
