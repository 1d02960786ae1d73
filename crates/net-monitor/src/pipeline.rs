//! Collect, evaluate, render, notify

use crate::collector::{Collector, CommandCollector};
use crate::config::{EmailConfig, MonitorConfig};
use crate::notifier::{AlertMessage, CommandNotifier, Notifier};
use crate::renderer::{Artifact, CommandRenderer, RenderRequest, Renderer};
use alerting::{evaluate, AlertRules, Evaluation, FailureReport};
use check_log::{last_days, CheckRecord, CsvLogSource, Freshness, LogSource};
use chrono::Local;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info, warn};

/// What happened to the alert notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Batch was not critical
    NotRequired,
    Sent,
    Failed(String),
    /// Batch was critical but there was no graph to attach
    SkippedNoArtifact,
}

/// Summary of one monitor run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub collector_ok: bool,
    pub evaluation: Evaluation,
    /// Records inside the render window, when a window is configured
    pub records_in_window: Option<usize>,
    pub artifact: Option<Artifact>,
    pub notification: NotificationOutcome,
}

/// Pipeline settings taken from [`MonitorConfig`]
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub rules: AlertRules,
    pub stale_after: Duration,
    pub days_to_display: Option<u32>,
    pub graph_output: PathBuf,
    pub email: EmailConfig,
}

impl From<&MonitorConfig> for PipelineSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            rules: config.rules.clone(),
            stale_after: config.stale_after(),
            days_to_display: config.days_to_display,
            graph_output: config.graph_path(),
            email: config.email.clone(),
        }
    }
}

/// One monitor run over a CSV check log
pub struct Pipeline {
    settings: PipelineSettings,
    log: CsvLogSource,
    collector: Box<dyn Collector>,
    renderer: Box<dyn Renderer>,
    notifier: Box<dyn Notifier>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        log: CsvLogSource,
        collector: Box<dyn Collector>,
        renderer: Box<dyn Renderer>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            log,
            collector,
            renderer,
            notifier,
        }
    }

    /// Pipeline backed by the configured external scripts
    pub fn from_config(config: &MonitorConfig) -> Self {
        let dir = &config.script_dir;
        Self::new(
            PipelineSettings::from(config),
            CsvLogSource::new(config.log_path()),
            Box::new(CommandCollector::new(
                config.collector.command.resolved(dir),
                &config.collector,
            )),
            Box::new(CommandRenderer::new(
                config.renderer.command.resolved(dir),
                &config.renderer,
            )),
            Box::new(CommandNotifier::new(
                config.notifier.command.resolved(dir),
                &config.notifier,
            )),
        )
    }

    pub async fn run(&self) -> RunReport {
        let started = Instant::now();

        let collector_ok = match self.collector.collect().await {
            Ok(outcome) => {
                info!(
                    "Collector completed ({} warnings)",
                    outcome.warnings.len()
                );
                true
            }
            Err(e) => {
                warn!("Collector failed: {}. Analysis may be based on old data", e);
                false
            }
        };

        let (evaluation, records_in_window) = self.evaluate_log();

        let artifact = if self.log.exists() {
            self.render().await
        } else {
            info!("Skipping graph generation because the check log does not exist");
            None
        };

        let notification = self.notify(&evaluation, artifact.as_ref()).await;

        info!("Monitor run finished in {:?}", started.elapsed());
        RunReport {
            collector_ok,
            evaluation,
            records_in_window,
            artifact,
            notification,
        }
    }

    fn evaluate_log(&self) -> (Evaluation, Option<usize>) {
        self.check_freshness();

        let records = match self.log.load() {
            Ok(records) => records,
            Err(e) => {
                warn!("{}; cannot determine status", e);
                Vec::new()
            }
        };

        let records_in_window = self
            .settings
            .days_to_display
            .map(|days| self.window_size(&records, days));

        let evaluation = evaluate(&records, &self.settings.rules);
        let report = FailureReport::new(&evaluation).to_string();
        for line in report.lines() {
            if evaluation.alert {
                warn!("{}", line);
            } else {
                info!("{}", line);
            }
        }
        (evaluation, records_in_window)
    }

    fn check_freshness(&self) {
        if !self.log.exists() {
            return;
        }
        let freshness = Freshness::assess(
            self.log.last_modified(),
            SystemTime::now(),
            self.settings.stale_after,
        );
        if let Some(message) = freshness_warning(freshness, self.settings.stale_after) {
            warn!("{}: {}", self.log.path().display(), message);
        }
    }

    /// Count the records the renderer will plot, warning when there are none
    fn window_size(&self, records: &[CheckRecord], days: u32) -> usize {
        let in_window = last_days(records, days, Local::now().naive_local()).len();
        if in_window == 0 && !records.is_empty() {
            warn!(
                "None of the {} logged records fall within the last {} days; the graph will be empty",
                records.len(),
                days
            );
        } else {
            debug!(
                "{} of {} records fall within the {}-day graph window",
                in_window,
                records.len(),
                days
            );
        }
        in_window
    }

    async fn render(&self) -> Option<Artifact> {
        let request = RenderRequest {
            log_path: self.log.path().to_path_buf(),
            output_path: self.settings.graph_output.clone(),
            days: self.settings.days_to_display,
        };
        match self.renderer.render(&request).await {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                error!("Graph generation failed: {}", e);
                None
            }
        }
    }

    async fn notify(
        &self,
        evaluation: &Evaluation,
        artifact: Option<&Artifact>,
    ) -> NotificationOutcome {
        if !evaluation.alert {
            info!("No critical alert conditions met; no notification needed");
            return NotificationOutcome::NotRequired;
        }
        let Some(artifact) = artifact else {
            warn!("Skipping notification because graph generation failed or was skipped");
            return NotificationOutcome::SkippedNoArtifact;
        };

        let message = AlertMessage::from_template(
            &self.settings.email,
            &evaluation.timestamp_display(),
            artifact.path.clone(),
        );
        match self.notifier.send(&message).await {
            Ok(()) => NotificationOutcome::Sent,
            Err(e) => {
                error!("Alert notification failed: {}", e);
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Warning for a log that exists but may not reflect the latest collector run
fn freshness_warning(freshness: Freshness, threshold: Duration) -> Option<String> {
    match freshness {
        Freshness::Fresh { .. } => None,
        Freshness::Stale { age } => Some(format!(
            "last written {}s ago (threshold {}s); analysis may be based on stale data",
            age.as_secs(),
            threshold.as_secs()
        )),
        Freshness::Unknown => Some(
            "could not read the modification time; data freshness is unknown".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{CollectorError, CollectorOutcome};
    use crate::notifier::NotifyError;
    use crate::renderer::RenderError;
    use alerting::BatchStatus;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    const HEADER: &str = "Timestamp,CheckType,CheckName,TargetHost,TargetPort,Success,Details\n";

    struct FakeCollector {
        fail: bool,
    }

    #[async_trait]
    impl Collector for FakeCollector {
        async fn collect(&self) -> Result<CollectorOutcome, CollectorError> {
            if self.fail {
                Err(CollectorError::ExitStatus(Some(1)))
            } else {
                Ok(CollectorOutcome::default())
            }
        }
    }

    struct FakeRenderer {
        produce: bool,
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn render(&self, request: &RenderRequest) -> Result<Artifact, RenderError> {
            if !self.produce {
                return Err(RenderError::MissingArtifact(request.output_path.clone()));
            }
            std::fs::write(&request.output_path, b"png").map_err(|_| {
                RenderError::MissingArtifact(request.output_path.clone())
            })?;
            Ok(Artifact {
                path: request.output_path.clone(),
                size: 3,
            })
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<AlertMessage>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &AlertMessage) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected { code: Some(1) });
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn write_log(dir: &Path, rows: &str) -> PathBuf {
        let path = dir.join("NetworkDiagnostics_Log.csv");
        std::fs::write(&path, format!("{HEADER}{rows}")).unwrap();
        path
    }

    fn pipeline(
        dir: &Path,
        log: PathBuf,
        collector_fails: bool,
        renders: bool,
        notifier: RecordingNotifier,
    ) -> Pipeline {
        let config = MonitorConfig {
            script_dir: dir.to_path_buf(),
            ..Default::default()
        };
        Pipeline::new(
            PipelineSettings::from(&config),
            CsvLogSource::new(log),
            Box::new(FakeCollector {
                fail: collector_fails,
            }),
            Box::new(FakeRenderer { produce: renders }),
            Box::new(notifier),
        )
    }

    const CRITICAL_ROWS: &str = "\
        2025-03-14 09:00:00,Outbound TCP,Gateway,10.0.0.5,443,False,old failure\n\
        2025-03-14 09:05:00,Inbound Listen Check,RDP,localhost,3389,False,not listening\n\
        2025-03-14 09:05:00,Outbound ICMP,Ping,10.0.0.1,,True,\n";

    #[tokio::test]
    async fn test_critical_batch_sends_notification() {
        let dir = tempfile::tempdir().unwrap();
        let log = write_log(dir.path(), CRITICAL_ROWS);
        let notifier = RecordingNotifier::default();

        let report = pipeline(dir.path(), log, false, true, notifier.clone())
            .run()
            .await;

        assert!(report.collector_ok);
        assert!(report.evaluation.alert);
        assert_eq!(report.evaluation.batch_size, 2);
        assert_eq!(report.notification, NotificationOutcome::Sent);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("Timestamp: 2025-03-14 09:05:00"));
        assert_eq!(sent[0].attachment, dir.path().join("network_status_graph.png"));
    }

    #[tokio::test]
    async fn test_healthy_batch_needs_no_notification() {
        let dir = tempfile::tempdir().unwrap();
        let log = write_log(
            dir.path(),
            "2025-03-14 09:05:00,Inbound Listen Check,SSH,localhost,22,False,\n\
             2025-03-14 09:05:00,Outbound TCP,Gateway,10.0.0.5,443,True,\n",
        );
        let notifier = RecordingNotifier::default();

        let report = pipeline(dir.path(), log, false, true, notifier.clone())
            .run()
            .await;

        assert_eq!(report.evaluation.status, BatchStatus::Degraded);
        assert_eq!(report.notification, NotificationOutcome::NotRequired);
        assert!(report.artifact.is_some());
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_alert_without_artifact_skips_notification() {
        let dir = tempfile::tempdir().unwrap();
        let log = write_log(dir.path(), CRITICAL_ROWS);
        let notifier = RecordingNotifier::default();

        let report = pipeline(dir.path(), log, false, false, notifier.clone())
            .run()
            .await;

        assert!(report.evaluation.alert);
        assert_eq!(report.artifact, None);
        assert_eq!(report.notification, NotificationOutcome::SkippedNoArtifact);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_collector_failure_still_evaluates_old_data() {
        let dir = tempfile::tempdir().unwrap();
        let log = write_log(dir.path(), CRITICAL_ROWS);

        let report = pipeline(dir.path(), log, true, true, RecordingNotifier::default())
            .run()
            .await;

        assert!(!report.collector_ok);
        assert!(report.evaluation.alert);
        assert_eq!(report.notification, NotificationOutcome::Sent);
    }

    #[tokio::test]
    async fn test_missing_log_is_no_data_and_not_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("missing.csv");

        let report = pipeline(dir.path(), log, false, true, RecordingNotifier::default())
            .run()
            .await;

        assert_eq!(report.evaluation.status, BatchStatus::NoData);
        assert!(!report.evaluation.alert);
        assert_eq!(report.artifact, None);
        assert_eq!(report.notification, NotificationOutcome::NotRequired);
    }

    #[tokio::test]
    async fn test_notifier_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let log = write_log(dir.path(), CRITICAL_ROWS);
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };

        let report = pipeline(dir.path(), log, false, true, notifier).run().await;

        assert!(matches!(report.notification, NotificationOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_render_window_counts_recent_records() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local::now().naive_local().format("%Y-%m-%d %H:%M:%S");
        let log = write_log(
            dir.path(),
            &format!(
                "2025-03-14 09:05:00,Outbound TCP,Gateway,10.0.0.5,443,True,\n\
                 {now},Outbound TCP,Gateway,10.0.0.5,443,True,\n"
            ),
        );

        let report = pipeline(dir.path(), log, false, true, RecordingNotifier::default())
            .run()
            .await;

        assert_eq!(report.evaluation.status, BatchStatus::Healthy);
        assert_eq!(report.records_in_window, Some(1));
    }

    #[tokio::test]
    async fn test_old_history_leaves_render_window_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = write_log(dir.path(), CRITICAL_ROWS);

        let report = pipeline(dir.path(), log, false, true, RecordingNotifier::default())
            .run()
            .await;

        assert_eq!(report.records_in_window, Some(0));
        assert!(report.evaluation.alert);
    }

    #[test]
    fn test_freshness_warnings() {
        let threshold = Duration::from_secs(300);

        assert_eq!(
            freshness_warning(Freshness::Fresh { age: Duration::from_secs(10) }, threshold),
            None
        );
        let stale = freshness_warning(Freshness::Stale { age: Duration::from_secs(900) }, threshold)
            .unwrap();
        assert!(stale.contains("900s ago"));
        let unknown = freshness_warning(Freshness::Unknown, threshold).unwrap();
        assert!(unknown.contains("modification time"));
    }
}
