//! Status graph renderer

use crate::command::{run_command, CommandError};
use crate::config::{CommandSpec, RendererConfig};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Renderer failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Graph file '{}' was not created or is empty", .0.display())]
    MissingArtifact(PathBuf),
}

/// What to render and where
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub log_path: PathBuf,
    pub output_path: PathBuf,
    /// Only plot the last N days
    pub days: Option<u32>,
}

/// A rendered, non-empty graph file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
}

impl Artifact {
    /// Inspect `path`; only an existing non-empty file is an artifact
    pub async fn from_path(path: &Path) -> Option<Self> {
        let metadata = tokio::fs::metadata(path).await.ok()?;
        (metadata.is_file() && metadata.len() > 0).then(|| Artifact {
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }
}

/// Produces a visualization of the check history
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<Artifact, RenderError>;
}

/// Renderer run as an external plotting script:
/// `<program> <script> <log> -o <output> [-d <days>]`
pub struct CommandRenderer {
    command: CommandSpec,
    timeout: Option<Duration>,
}

impl CommandRenderer {
    pub fn new(command: CommandSpec, config: &RendererConfig) -> Self {
        Self {
            command,
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    fn args(&self, request: &RenderRequest) -> Vec<OsString> {
        let mut args = self.command.base_args();
        args.push(request.log_path.clone().into_os_string());
        args.push("-o".into());
        args.push(request.output_path.clone().into_os_string());
        if let Some(days) = request.days {
            args.push("-d".into());
            args.push(days.to_string().into());
        }
        args
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<Artifact, RenderError> {
        info!("Generating graph using {}", self.command.script.display());

        // A graph left over from an earlier run must never be attached
        match tokio::fs::remove_file(&request.output_path).await {
            Ok(()) => info!("Removed previous graph {}", request.output_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove previous graph: {}", e),
        }

        let output = run_command(
            "Renderer",
            &self.command.program,
            &self.args(request),
            self.timeout,
        )
        .await?;

        if !output.success() {
            warn!(
                "Renderer exited with code {:?}; graph might not be generated correctly",
                output.code
            );
        }

        let artifact = Artifact::from_path(&request.output_path)
            .await
            .ok_or_else(|| RenderError::MissingArtifact(request.output_path.clone()))?;
        info!("Graph saved to {} ({} bytes)", artifact.path.display(), artifact.size);
        Ok(artifact)
    }
}
