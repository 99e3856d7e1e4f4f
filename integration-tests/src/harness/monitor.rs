use crate::harness::{init_test_tracing, wait_for_event};
use accesswatch_core::cli::loadgen::format_line;
use accesswatch_core::cli::run::run_monitor;
use accesswatch_core::conf::MonitorConfig;
use accesswatch_core::ingest::IngestSummary;
use accesswatch_core::metrics::{ChannelSink, SinkEvent};
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Short windows so end-to-end tests finish in a few seconds.
pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        stats_period_seconds: 1,
        alert_period_seconds: 1,
        top_k: 3,
        threshold: 1_000.0,
        poll_interval_milliseconds: 10,
        ..Default::default()
    }
}

/// A common-log line stamped with the current time.
pub fn access_line(user: &str, page: &str, status: u16) -> String {
    format_line(user, page, status, Utc::now())
}

/// Handle to a monitor running against a log file in a temp directory.
pub struct TestMonitor {
    _dir: TempDir,
    path: PathBuf,
    events: UnboundedReceiver<SinkEvent>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<anyhow::Result<IngestSummary>>,
}

impl TestMonitor {
    /// Creates an empty log file, seeded with `history`, and starts
    /// monitoring it. `cfg.file` is replaced by the temp file.
    pub async fn start(mut cfg: MonitorConfig, history: &[String]) -> Self {
        init_test_tracing();

        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("access.log");
        fs::write(&path, history.concat()).expect("failed to seed log file");
        cfg.file = path.clone();

        let (sink, events) = ChannelSink::channel();
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            run_monitor(&cfg, Arc::new(sink), async {
                let _ = shutdown_rx.await;
            })
            .await
        });

        // Lines appended from here on are dated after the monitor started.
        let file = path.display().to_string();
        wait_for_event(
            |e| {
                e.message() == Some("monitoring access log") && e.field("file") == Some(file.as_str())
            },
            EVENT_TIMEOUT,
        )
        .await;

        Self {
            _dir: dir,
            path,
            events,
            shutdown,
            task,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, lines: &[String]) {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .expect("failed to open log file");
        file.write_all(lines.concat().as_bytes())
            .expect("failed to append to log file");
    }

    pub async fn next_event(&mut self) -> SinkEvent {
        timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for a sink event")
            .expect("sink closed")
    }

    pub async fn shutdown(self) -> anyhow::Result<IngestSummary> {
        let _ = self.shutdown.send(());
        self.task.await.expect("monitor task panicked")
    }
}
