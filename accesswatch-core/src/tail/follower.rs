//! Log file follower
//!
//! Polls a growing file for complete lines, starting from its first byte.
//! When the file at the followed path is replaced (rotation), the old handle
//! is read to EOF before the new file is opened. When it shrinks below the
//! read position (truncation), reading restarts at offset 0.

use crate::tail::error::FollowError;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

const LINE_CHANNEL_CAPACITY: usize = 1024;

pub struct Tailer {
    path: PathBuf,
    poll_interval: Duration,
}

/// Controls a running follower.
pub struct TailHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), FollowError>>,
}

impl Tailer {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
        }
    }

    /// Opens the file and spawns the follower. Fails if the file does not
    /// exist yet.
    pub async fn start(self) -> Result<(mpsc::Receiver<String>, TailHandle), FollowError> {
        let source = LogSource::open(&self.path)
            .await
            .map_err(|source| FollowError::Open {
                path: self.path.clone(),
                source,
            })?;

        let (lines_tx, lines_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = watch::channel(false);

        let follower = Follower {
            path: self.path,
            poll_interval: self.poll_interval,
            source,
            partial: Vec::new(),
            missing: false,
            lines_tx,
            stop_rx,
        };
        let task = tokio::spawn(follower.run());

        Ok((lines_rx, TailHandle { stop_tx, task }))
    }
}

impl TailHandle {
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Resolves when the follower exits, with the error that ended it, if any.
    pub async fn wait(self) -> Result<(), FollowError> {
        self.task.await?
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileId {
    dev: u64,
    ino: u64,
}

#[cfg(unix)]
fn file_id(meta: &std::fs::Metadata) -> Option<FileId> {
    use std::os::unix::fs::MetadataExt;
    Some(FileId {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

// Rotation is only detected through truncation here.
#[cfg(not(unix))]
fn file_id(_meta: &std::fs::Metadata) -> Option<FileId> {
    None
}

struct LogSource {
    reader: BufReader<File>,
    id: Option<FileId>,
    pos: u64,
}

impl LogSource {
    async fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path).await?;
        let meta = file.metadata().await?;
        Ok(Self {
            reader: BufReader::new(file),
            id: file_id(&meta),
            pos: 0,
        })
    }
}

struct Follower {
    path: PathBuf,
    poll_interval: Duration,
    source: LogSource,
    // Bytes of a line whose newline has not been written yet.
    partial: Vec<u8>,
    missing: bool,
    lines_tx: mpsc::Sender<String>,
    stop_rx: watch::Receiver<bool>,
}

impl Follower {
    async fn run(mut self) -> Result<(), FollowError> {
        info!(path = %self.path.display(), "following log file");

        loop {
            if *self.stop_rx.borrow() {
                break;
            }

            let n = self
                .source
                .reader
                .read_until(b'\n', &mut self.partial)
                .await
                .map_err(|source| FollowError::Read {
                    path: self.path.clone(),
                    source,
                })?;

            if n > 0 {
                self.source.pos += n as u64;
                if self.partial.ends_with(b"\n") {
                    let line = take_line(&mut self.partial);
                    if !self.emit(line).await {
                        break;
                    }
                }
                continue;
            }

            tokio::select! {
                _ = time::sleep(self.poll_interval) => {}
                _ = self.stop_rx.changed() => break,
            }

            self.check_file().await?;
        }

        info!(path = %self.path.display(), "log follower stopped");
        Ok(())
    }

    /// Returns false once nobody is listening or a stop was requested.
    async fn emit(&mut self, line: String) -> bool {
        tokio::select! {
            sent = self.lines_tx.send(line) => sent.is_ok(),
            _ = self.stop_rx.changed() => false,
        }
    }

    /// Runs at EOF: detects rotation and truncation of the followed path.
    async fn check_file(&mut self) -> Result<(), FollowError> {
        let meta = match fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !self.missing {
                    warn!(path = %self.path.display(), "log file is gone, waiting for it to reappear");
                    self.missing = true;
                }
                return Ok(());
            }
            Err(source) => {
                return Err(FollowError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        self.missing = false;

        if file_id(&meta) != self.source.id {
            match LogSource::open(&self.path).await {
                Ok(source) => {
                    info!(path = %self.path.display(), "log file rotated, reopening");
                    if !self.partial.is_empty() {
                        debug!(
                            bytes = self.partial.len(),
                            "discarding unterminated last line of rotated file"
                        );
                        self.partial.clear();
                    }
                    self.source = source;
                }
                // Replaced again between stat and open; retry next poll.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(FollowError::Open {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
            return Ok(());
        }

        if meta.len() < self.source.pos {
            info!(path = %self.path.display(), "log file truncated, reading from the start");
            self.source
                .reader
                .seek(SeekFrom::Start(0))
                .await
                .map_err(|source| FollowError::Read {
                    path: self.path.clone(),
                    source,
                })?;
            self.source.pos = 0;
            self.partial.clear();
        }

        Ok(())
    }
}

fn take_line(buf: &mut Vec<u8>) -> String {
    let mut line = &buf[..];
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest;
    }
    if let Some(rest) = line.strip_suffix(b"\r") {
        line = rest;
    }
    let line = String::from_utf8_lossy(line).into_owned();
    buf.clear();
    line
}
