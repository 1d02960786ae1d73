//! Subprocess runner shared by the external collaborators

use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Errors launching or waiting on an external program
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {} seconds", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

/// Captured result of a finished program
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run `program` with `args`, capturing output.
///
/// Output is decoded lossily. With a `timeout`, the child is killed when the
/// deadline passes.
pub async fn run_command(
    label: &str,
    program: &str,
    args: &[OsString],
    timeout: Option<Duration>,
) -> Result<CommandOutput, CommandError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Executing {}: {:?}", label, command);

    let pending = command.output();
    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, pending)
            .await
            .map_err(|_| CommandError::Timeout {
                program: program.to_string(),
                timeout: limit,
            })?,
        None => pending.await,
    }
    .map_err(|source| CommandError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let result = CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !result.stdout.trim().is_empty() {
        info!("{} output:\n{}", label, result.stdout.trim_end());
    }
    if !result.stderr.trim().is_empty() {
        warn!("{} errors/warnings:\n{}", label, result.stderr.trim_end());
    }
    debug!("{} exited with {:?}", label, result.code);

    Ok(result)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<OsString> {
        vec![OsString::from("-c"), OsString::from(script)]
    }

    #[tokio::test]
    async fn test_captures_output_and_code() {
        let output = run_command("test", "sh", &sh("echo hello; echo oops >&2; exit 3"), None)
            .await
            .unwrap();

        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = run_command("test", "definitely-not-a-real-program", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = run_command("test", "sh", &sh("sleep 5"), Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }
}
