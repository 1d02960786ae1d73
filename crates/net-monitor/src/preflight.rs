//! Startup checks for the external scripts

use crate::config::MonitorConfig;
use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("Required script files are missing:{}", format_missing(.0))]
    MissingScripts(Vec<(&'static str, PathBuf)>),
}

fn format_missing(missing: &[(&'static str, PathBuf)]) -> String {
    missing.iter().fold(String::new(), |mut out, (name, path)| {
        let _ = write!(out, " {} at '{}';", name, path.display());
        out
    })
}

/// Scripts that must exist before a run is attempted
pub struct Preflight {
    required: Vec<(&'static str, PathBuf)>,
}

impl Preflight {
    pub fn new(required: Vec<(&'static str, PathBuf)>) -> Self {
        Self { required }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(vec![
            ("collector script", config.resolve(&config.collector.command.script)),
            ("renderer script", config.resolve(&config.renderer.command.script)),
            ("mailer script", config.resolve(&config.notifier.command.script)),
        ])
    }

    /// Report every missing script at once
    pub fn check(&self) -> Result<(), PreflightError> {
        let missing: Vec<_> = self
            .required
            .iter()
            .filter(|(_, path)| !path.exists())
            .cloned()
            .collect();

        if missing.is_empty() {
            info!("Required script files found");
            return Ok(());
        }
        for (name, path) in &missing {
            error!("{} not found at '{}'", name, path.display());
        }
        Err(PreflightError::MissingScripts(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_all_missing_scripts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hulcon.ps1"), b"").unwrap();

        let config = MonitorConfig {
            script_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let err = Preflight::from_config(&config).check().unwrap_err();

        let PreflightError::MissingScripts(missing) = err;
        let names: Vec<_> = missing.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["renderer script", "mailer script"]);
    }

    #[test]
    fn test_all_present() {
        let dir = tempfile::tempdir().unwrap();
        for script in ["hulcon.ps1", "NDP.py", "SendEmail2Admin_HTML.vbs"] {
            std::fs::write(dir.path().join(script), b"").unwrap();
        }
        let config = MonitorConfig {
            script_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(Preflight::from_config(&config).check().is_ok());
    }
}
