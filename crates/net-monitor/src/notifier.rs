//! Alert notification

use crate::command::{run_command, CommandError};
use crate::config::{CommandSpec, EmailConfig, NotifierConfig};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Notification failures
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Attachment '{}' not found", .0.display())]
    MissingAttachment(PathBuf),

    #[error("Mailer did not confirm delivery (exit code {code:?})")]
    Rejected { code: Option<i32> },
}

/// A message announcing a critical batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
    pub attachment: PathBuf,
}

impl AlertMessage {
    /// Build the fixed subject and templated body for `timestamp`
    pub fn from_template(email: &EmailConfig, timestamp: &str, attachment: PathBuf) -> Self {
        Self {
            subject: email.subject.clone(),
            body: email.render_body(timestamp),
            attachment,
        }
    }
}

/// Delivers alert messages to a human
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotifyError>;
}

/// Mailer run as an external script: `<program> <args> <script> <subject> <attachment> <body>`
pub struct CommandNotifier {
    command: CommandSpec,
    timeout: Duration,
    success_marker: String,
}

impl CommandNotifier {
    pub fn new(command: CommandSpec, config: &NotifierConfig) -> Self {
        Self {
            command,
            timeout: Duration::from_secs(config.timeout_secs),
            success_marker: config.success_marker.clone(),
        }
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotifyError> {
        if !tokio::fs::try_exists(&message.attachment).await.unwrap_or(false) {
            return Err(NotifyError::MissingAttachment(message.attachment.clone()));
        }

        info!("Sending alert notification: {}", message.subject);
        let mut args = self.command.base_args();
        args.push(message.subject.clone().into());
        args.push(message.attachment.clone().into_os_string());
        args.push(message.body.clone().into());

        let output = run_command("Mailer", &self.command.program, &args, Some(self.timeout)).await?;
        if output.success() && output.stdout.contains(&self.success_marker) {
            info!("Alert notification sent");
            Ok(())
        } else {
            Err(NotifyError::Rejected { code: output.code })
        }
    }
}
