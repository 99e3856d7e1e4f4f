use accesswatch_core::cli::run::run_monitor;
use accesswatch_core::metrics::alert::AlertKind;
use accesswatch_core::metrics::{ChannelSink, SinkEvent, StatsSnapshot};
use integration_tests::harness::{TestMonitor, access_line, test_config, wait_for_event};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const HISTORY: &str =
    "127.0.0.1 asd james [09/May/2018:16:00:39 +0000] \"GET /report HTTP/1.0\" 200 123\n";

/// Merges snapshots until `expected` requests have been seen.
async fn collect_stats(monitor: &mut TestMonitor, expected: usize) -> Vec<StatsSnapshot> {
    let mut seen = Vec::new();
    let mut requests = 0.0;

    while requests < expected as f64 {
        if let SinkEvent::Stats(snapshot) = monitor.next_event().await {
            requests += snapshot.req_per_sec * snapshot.window.as_secs_f64();
            seen.push(snapshot);
        }
    }

    seen
}

fn section_totals(snapshots: &[StatsSnapshot]) -> HashMap<String, i64> {
    let mut totals = HashMap::new();
    for entry in snapshots.iter().flat_map(|s| &s.top_sections) {
        *totals.entry(entry.key.clone()).or_default() += entry.score;
    }
    totals
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn live_lines_are_counted_and_history_is_skipped() {
    let mut monitor = TestMonitor::start(test_config(), &[HISTORY.to_string()]).await;

    monitor.append(&[
        access_line("james", "/pages/create", 200),
        access_line("jill", "/pages/edit", 404),
        access_line("-", "/api/user", 200),
    ]);

    let snapshots = collect_stats(&mut monitor, 3).await;

    let totals = section_totals(&snapshots);
    assert_eq!(totals.get("/pages"), Some(&2));
    assert_eq!(totals.get("/api"), Some(&1));
    assert_eq!(totals.get("/report"), None);

    let summary = monitor.shutdown().await.unwrap();
    assert_eq!(summary.accepted, 3);
    assert_eq!(summary.stale, 1);
    assert_eq!(summary.malformed, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_lines_are_logged_and_skipped() {
    let mut monitor = TestMonitor::start(test_config(), &[]).await;

    monitor.append(&[
        "this is not an access log line\n".to_string(),
        access_line("james", "/ok", 200),
    ]);

    collect_stats(&mut monitor, 1).await;

    wait_for_event(
        |e| {
            e.level == tracing::Level::WARN
                && e.message() == Some("discarding log line")
                && e.field("error")
                    .is_some_and(|err| err.contains("this is not an access log line"))
        },
        Duration::from_secs(5),
    )
    .await;

    let summary = monitor.shutdown().await.unwrap();
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.malformed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_raises_then_resolves_alert() {
    let mut cfg = test_config();
    cfg.threshold = 2.0;
    let mut monitor = TestMonitor::start(cfg, &[]).await;

    let burst: Vec<String> = (0..5)
        .map(|_| access_line("james", "/burst", 200))
        .collect();
    monitor.append(&burst);

    let mut alerts = Vec::new();
    while alerts.len() < 2 {
        if let SinkEvent::Alert(event) = monitor.next_event().await {
            alerts.push(event);
        }
    }

    assert_eq!(alerts[0].kind, AlertKind::HighTraffic);
    assert!(alerts[0].value >= 2.0);
    assert_eq!(alerts[1].kind, AlertKind::Resolved);
    assert!(alerts[1].value < 2.0);

    monitor.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn partial_line_waits_for_its_newline() {
    let mut monitor = TestMonitor::start(test_config(), &[]).await;

    let line = access_line("james", "/slow/write", 200);
    let (head, tail) = line.split_at(20);
    monitor.append(&[head.to_string()]);
    tokio::time::sleep(Duration::from_millis(100)).await;
    monitor.append(&[tail.to_string()]);

    let snapshots = collect_stats(&mut monitor, 1).await;
    assert_eq!(section_totals(&snapshots).get("/slow"), Some(&1));

    let summary = monitor.shutdown().await.unwrap();
    assert_eq!(summary.malformed, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_log_file_fails_fast() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut cfg = test_config();
    cfg.file = dir.path().join("does-not-exist.log");
    let (sink, _events) = ChannelSink::channel();

    let err = run_monitor(&cfg, Arc::new(sink), std::future::pending())
        .await
        .unwrap_err();

    assert!(
        format!("{err:#}").contains("cannot follow"),
        "unexpected error: {err:#}"
    );
}
