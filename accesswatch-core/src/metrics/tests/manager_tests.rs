use crate::metrics::alert::AlertKind;
use crate::metrics::lifecycle::LifecycleState;
use crate::metrics::topk::TopKEntry;
use crate::metrics::{
    ChannelSink, ManagerParams, MetricsError, SinkEvent, StatsManager, StatsSnapshot,
    is_error_status,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;

const STATS_PERIOD: Duration = Duration::from_secs(10);

fn params(sink: ChannelSink) -> ManagerParams {
    ManagerParams {
        alert_period: Duration::from_secs(120),
        stats_period: STATS_PERIOD,
        k: 3,
        threshold: 1_000.0,
        queue_capacity: 1024,
        sink: Arc::new(sink),
    }
}

fn manager() -> (StatsManager, UnboundedReceiver<SinkEvent>) {
    let (sink, rx) = ChannelSink::channel();
    (StatsManager::new(params(sink)).unwrap(), rx)
}

async fn next_stats(rx: &mut UnboundedReceiver<SinkEvent>) -> StatsSnapshot {
    loop {
        match rx.recv().await.expect("sink closed") {
            SinkEvent::Stats(snapshot) => return snapshot,
            SinkEvent::Alert(_) => continue,
        }
    }
}

fn entry(key: &str, score: i64) -> TopKEntry {
    TopKEntry {
        key: key.to_string(),
        score,
    }
}

#[test]
fn error_status_classification() {
    for code in [100, 199, 400, 404, 500, 599] {
        assert!(is_error_status(code), "{code} should be an error");
    }
    for code in [200, 204, 300, 302, 399] {
        assert!(!is_error_status(code), "{code} should not be an error");
    }
}

#[test]
fn new_rejects_invalid_params() {
    let (sink, _rx) = ChannelSink::channel();
    let base = params(sink);

    let mut p = base.clone();
    p.stats_period = Duration::ZERO;
    assert_eq!(
        StatsManager::new(p).err(),
        Some(MetricsError::InvalidStatPeriod {
            period: Duration::ZERO
        })
    );

    let mut p = base.clone();
    p.alert_period = Duration::ZERO;
    assert_eq!(
        StatsManager::new(p).err(),
        Some(MetricsError::InvalidAlertPeriod {
            period: Duration::ZERO
        })
    );

    let mut p = base.clone();
    p.k = 0;
    assert_eq!(
        StatsManager::new(p).err(),
        Some(MetricsError::InvalidTopK { k: 0 })
    );

    let mut p = base;
    p.queue_capacity = 0;
    assert_eq!(
        StatsManager::new(p).err(),
        Some(MetricsError::InvalidQueueCapacity { capacity: 0 })
    );
}

#[tokio::test(start_paused = true)]
async fn snapshot_reports_window_then_resets() {
    let (manager, mut rx) = manager();
    manager.start();

    for _ in 0..5 {
        manager.observe_request();
    }
    for section in ["/foo", "/bar", "/foo", "/baz", "/foo"] {
        manager.observe_section(section);
    }
    for user in ["james", "jill", "james"] {
        manager.observe_user(user);
    }
    for code in [200, 200, 404, 500, 302] {
        manager.observe_status_code(code);
    }

    let snapshot = next_stats(&mut rx).await;

    assert_eq!(snapshot.window, STATS_PERIOD);
    assert_eq!(snapshot.req_per_sec, 0.5);
    assert_eq!(snapshot.err_per_sec, 0.2);
    assert_eq!(
        snapshot.top_sections,
        vec![entry("/foo", 3), entry("/bar", 1), entry("/baz", 1)]
    );
    assert_eq!(snapshot.top_users, vec![entry("james", 2), entry("jill", 1)]);
    assert_eq!(
        snapshot.top_status_codes,
        vec![entry("200", 2), entry("302", 1), entry("404", 1)]
    );
    assert_eq!(snapshot.dropped, 0);

    // Nothing observed since the flush.
    let next = next_stats(&mut rx).await;
    assert!(next.is_empty());

    manager.stop();
    manager.wait().await;
}

#[tokio::test(start_paused = true)]
async fn observations_before_start_are_ignored() {
    let (manager, mut rx) = manager();

    manager.observe_request();
    manager.observe_section("/foo");
    manager.observe_status_code(500);

    manager.start();

    let snapshot = next_stats(&mut rx).await;
    assert!(snapshot.is_empty());

    manager.stop();
    manager.wait().await;
}

#[tokio::test(start_paused = true)]
async fn stop_before_start_is_a_no_op() {
    let (manager, mut rx) = manager();

    manager.stop();
    assert_eq!(manager.state(), LifecycleState::Created);

    manager.start();
    manager.observe_request();

    let snapshot = next_stats(&mut rx).await;
    assert_eq!(snapshot.req_per_sec, 0.1);

    manager.stop();
    manager.wait().await;
}

#[tokio::test(start_paused = true)]
async fn start_twice_runs_a_single_loop() {
    let (manager, mut rx) = manager();

    manager.start();
    manager.start();
    assert_eq!(manager.state(), LifecycleState::Running);

    next_stats(&mut rx).await;
    tokio::time::sleep(STATS_PERIOD / 2).await;

    // A second loop would have flushed at the same instant.
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    manager.stop();
    manager.stop();
    assert_eq!(manager.state(), LifecycleState::Stopped);
    manager.wait().await;
}

#[tokio::test(start_paused = true)]
async fn observations_after_stop_never_block() {
    let (manager, _rx) = manager();
    manager.start();
    manager.stop();
    manager.wait().await;

    for _ in 0..10_000 {
        manager.observe_request();
        manager.observe_section("/foo");
        manager.observe_user("james");
        manager.observe_status_code(500);
    }
}

#[tokio::test(start_paused = true)]
async fn full_queue_drops_and_counts() {
    let (sink, mut rx) = ChannelSink::channel();
    let mut p = params(sink);
    p.queue_capacity = 2;
    let manager = StatsManager::new(p).unwrap();
    manager.start();

    // The loop cannot run until this task yields, so only 2 fit.
    for _ in 0..5 {
        manager.observe_section("/foo");
    }

    let snapshot = next_stats(&mut rx).await;
    assert_eq!(snapshot.top_sections, vec![entry("/foo", 2)]);
    assert_eq!(snapshot.dropped, 3);

    // The dropped counter is per window.
    let next = next_stats(&mut rx).await;
    assert_eq!(next.dropped, 0);

    manager.stop();
    manager.wait().await;
}

#[tokio::test(start_paused = true)]
async fn alerts_reach_the_sink() {
    let (sink, mut rx) = ChannelSink::channel();
    let mut p = params(sink);
    p.alert_period = Duration::from_secs(1);
    p.threshold = 2.0;
    let manager = StatsManager::new(p).unwrap();
    manager.start();

    for _ in 0..3 {
        manager.observe_request();
    }

    let mut kinds = Vec::new();
    while kinds.len() < 2 {
        if let Some(SinkEvent::Alert(event)) = rx.recv().await {
            kinds.push(event.kind);
        }
    }

    assert_eq!(kinds, vec![AlertKind::HighTraffic, AlertKind::Resolved]);

    manager.stop();
    manager.wait().await;
}
