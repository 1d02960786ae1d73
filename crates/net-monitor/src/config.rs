//! Monitor configuration
//!
//! Layered from built-in defaults, an optional TOML file, and `NETMON__*`
//! environment variables (e.g. `NETMON__RULES__CRITICAL_INBOUND_PORT=3390`).

use alerting::AlertRules;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file looked up in the working directory when none is given
const DEFAULT_CONFIG_NAME: &str = "net-monitor";
const ENV_PREFIX: &str = "NETMON";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// External program invocation: `<program> <args...> <script> <call args...>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub script: PathBuf,
}

impl CommandSpec {
    fn new(program: &str, args: &[&str], script: &str) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            script: PathBuf::from(script),
        }
    }

    /// Leading arguments followed by the script path
    pub fn base_args(&self) -> Vec<OsString> {
        self.args
            .iter()
            .map(OsString::from)
            .chain(std::iter::once(self.script.clone().into_os_string()))
            .collect()
    }

    /// Same command with its script resolved against `dir`
    pub fn resolved(&self, dir: &Path) -> Self {
        Self {
            script: dir.join(&self.script),
            ..self.clone()
        }
    }
}

/// Network check collector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub command: CommandSpec,
    /// Stderr marker groups; a group matches when all of its markers appear
    pub fatal_markers: Vec<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            command: CommandSpec::new(
                "powershell.exe",
                &["-ExecutionPolicy", "Bypass", "-NoProfile", "-File"],
                "hulcon.ps1",
            ),
            fatal_markers: vec![
                vec!["FATAL: Failed to write results to CSV".to_string()],
                vec!["Access to the path".to_string(), "is denied".to_string()],
            ],
            timeout_secs: None,
        }
    }
}

/// Graph renderer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub command: CommandSpec,
    pub timeout_secs: Option<u64>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: CommandSpec::new("python", &[], "NDP.py"),
            timeout_secs: None,
        }
    }
}

/// Mail sender settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub command: CommandSpec,
    pub timeout_secs: u64,
    /// Text the mailer prints on stdout after a successful send
    pub success_marker: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            command: CommandSpec::new("cscript.exe", &["//Nologo"], "SendEmail2Admin_HTML.vbs"),
            timeout_secs: 60,
            success_marker: "SUCCESS".to_string(),
        }
    }
}

/// Alert message text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub subject: String,
    /// Body with a `{timestamp}` placeholder; `|` is a line break for the mailer
    pub body_template: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            subject: "HULFT Network Alert: RDP or Outbound Connectivity Issues Detected".to_string(),
            body_template: "Critical network checks failed (RDP Listen or Outbound).|\
                            See attached graph for details.|Timestamp: {timestamp}"
                .to_string(),
        }
    }
}

impl EmailConfig {
    pub fn render_body(&self, timestamp: &str) -> String {
        self.body_template.replace("{timestamp}", timestamp)
    }
}

/// Top-level monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Base directory for scripts, the check log, and the graph
    pub script_dir: PathBuf,
    pub log_file: PathBuf,
    pub graph_output: PathBuf,
    /// Log older than this is reported as stale
    pub stale_after_minutes: u64,
    /// History window handed to the renderer; `None` renders everything
    pub days_to_display: Option<u32>,
    pub rules: AlertRules,
    pub collector: CollectorConfig,
    pub renderer: RendererConfig,
    pub notifier: NotifierConfig,
    pub email: EmailConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            script_dir: PathBuf::from("."),
            log_file: PathBuf::from("NetworkDiagnostics_Log.csv"),
            graph_output: PathBuf::from("network_status_graph.png"),
            stale_after_minutes: 5,
            days_to_display: Some(3),
            rules: AlertRules::default(),
            collector: CollectorConfig::default(),
            renderer: RendererConfig::default(),
            notifier: NotifierConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from `path` (required) or `net-monitor.toml` (optional),
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config: MonitorConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notifier.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "notifier.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.days_to_display == Some(0) {
            return Err(ConfigError::Invalid(
                "days_to_display must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Valid but suspicious settings, for logging once tracing is up
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.rules.critical_check_types.is_empty() {
            warnings.push(
                "No critical check types configured; only the inbound port rule can alert"
                    .to_string(),
            );
        }
        if self.stale_after_minutes == 0 {
            warnings.push("stale_after_minutes is 0; every log will be reported as stale".to_string());
        }
        warnings
    }

    /// `path` resolved against the script directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.script_dir.join(path)
    }

    pub fn log_path(&self) -> PathBuf {
        self.resolve(&self.log_file)
    }

    pub fn graph_path(&self) -> PathBuf {
        self.resolve(&self.graph_output)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_minutes * 60)
    }
}
