use crate::tail::{FollowError, Tailer};
use pretty_assertions::assert_eq;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

const POLL: Duration = Duration::from_millis(10);
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn append(path: &Path, data: &str) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(data.as_bytes()).unwrap();
    file.flush().unwrap();
}

async fn next_line(rx: &mut mpsc::Receiver<String>) -> String {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a line")
        .expect("follower closed the channel")
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();

    let err = Tailer::new(dir.path().join("access.log"), POLL)
        .start()
        .await
        .err()
        .unwrap();

    assert!(matches!(err, FollowError::Open { .. }), "got {err:?}");
}

#[tokio::test]
async fn reads_existing_then_appended_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("access.log");
    append(&path, "first\nsecond\r\n");

    let (mut rx, handle) = Tailer::new(&path, POLL).start().await.unwrap();

    assert_eq!(next_line(&mut rx).await, "first");
    assert_eq!(next_line(&mut rx).await, "second");

    append(&path, "thi");
    tokio::time::sleep(POLL * 5).await;
    assert!(rx.try_recv().is_err(), "partial line must not be emitted");

    append(&path, "rd\n");
    assert_eq!(next_line(&mut rx).await, "third");

    handle.stop();
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn truncation_restarts_from_the_beginning() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("access.log");
    append(&path, "a fairly long first line\nanother long line\n");

    let (mut rx, handle) = Tailer::new(&path, POLL).start().await.unwrap();
    next_line(&mut rx).await;
    next_line(&mut rx).await;

    std::fs::write(&path, "").unwrap();
    tokio::time::sleep(POLL * 5).await;
    append(&path, "after\n");

    assert_eq!(next_line(&mut rx).await, "after");

    handle.stop();
    handle.wait().await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn rotation_drains_old_file_then_follows_new_one() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("access.log");
    append(&path, "one\n");

    let (mut rx, handle) = Tailer::new(&path, POLL).start().await.unwrap();
    assert_eq!(next_line(&mut rx).await, "one");

    append(&path, "two\n");
    std::fs::rename(&path, dir.path().join("access.log.1")).unwrap();
    append(&path, "three\n");

    assert_eq!(next_line(&mut rx).await, "two");
    assert_eq!(next_line(&mut rx).await, "three");

    handle.stop();
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn stop_closes_the_line_channel() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("access.log");
    append(&path, "");

    let (mut rx, handle) = Tailer::new(&path, POLL).start().await.unwrap();
    handle.stop();
    handle.wait().await.unwrap();

    assert_eq!(rx.recv().await, None);
}
