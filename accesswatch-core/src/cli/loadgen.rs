//! Appends synthetic access-log lines to a file, stamped with the current
//! time, so a running monitor has live traffic to chew on.

use crate::ingest::CLF_TIMESTAMP_FORMAT;
use anyhow::Context;
use chrono::Local;
use clap::Args;
use rand::{Rng, rng};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

const PAGES: &[&str] = &["/foo/bar", "/some/page", "/a/b/c/d", "/x/z", "/"];
const STATUS_CODES: &[u16] = &[200, 404, 500, 302];
const USERS: &[&str] = &["james", "jill", "frank", "-"];

#[derive(Args, Debug)]
pub struct LoadgenArgs {
    /// Log file to append to (created if missing)
    #[arg(short, long, default_value = "/tmp/access.log")]
    pub file: PathBuf,

    /// Shortest pause between two lines
    #[arg(long, default_value_t = 50)]
    pub min_delay_ms: u64,

    /// Longest pause between two lines
    #[arg(long, default_value_t = 550)]
    pub max_delay_ms: u64,

    /// Stop after this many lines (runs until interrupted by default)
    #[arg(short = 'n', long)]
    pub count: Option<u64>,
}

pub async fn run(args: LoadgenArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.min_delay_ms <= args.max_delay_ms,
        "--min-delay-ms ({}) must not exceed --max-delay-ms ({})",
        args.min_delay_ms,
        args.max_delay_ms
    );

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.file)
        .await
        .with_context(|| format!("cannot open {}", args.file.display()))?;

    info!(file = %args.file.display(), "generating traffic");

    let mut written = 0u64;
    while args.count.is_none_or(|count| written < count) {
        let (line, delay) = next_line(args.min_delay_ms, args.max_delay_ms);

        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("cannot write to {}", args.file.display()))?;
        written += 1;

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    file.flush().await?;
    info!(written, "traffic generation finished");
    Ok(())
}

// ThreadRng is not Send, so it never lives across an await.
fn next_line(min_delay_ms: u64, max_delay_ms: u64) -> (String, Duration) {
    let mut rng = rng();

    let page = PAGES[rng.random_range(0..PAGES.len())];
    let status = STATUS_CODES[rng.random_range(0..STATUS_CODES.len())];
    let user = USERS[rng.random_range(0..USERS.len())];
    let delay = Duration::from_millis(rng.random_range(min_delay_ms..=max_delay_ms));

    (format_line(user, page, status, Local::now()), delay)
}

pub fn format_line<Tz>(user: &str, page: &str, status: u16, now: chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "127.0.0.1 - {user} [{}] \"GET {page} HTTP/1.0\" {status} 123\n",
        now.format(CLF_TIMESTAMP_FORMAT)
    )
}
