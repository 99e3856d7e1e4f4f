use crate::conf::{ConfigOverrides, MonitorConfig, resolve_config};
use crate::ingest::{IngestSummary, LogMonitor};
use crate::logging::LogFormat;
use crate::metrics::{ConsoleSink, JsonSink, StatsManager, StatsSink};
use crate::tail::Tailer;
use anyhow::Context;
use clap::Args;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to an HCL config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Diagnostic log format (pretty on a terminal, json otherwise)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print stats and alerts as JSON lines
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let cfg = resolve_config(args.config.as_deref(), &args.overrides)
        .context("cannot load configuration")?;

    let sink: Arc<dyn StatsSink> = if args.json {
        Arc::new(JsonSink)
    } else {
        Arc::new(ConsoleSink::new())
    };

    let summary = run_monitor(&cfg, sink, shutdown_signal()).await?;

    info!(
        accepted = summary.accepted,
        malformed = summary.malformed,
        stale = summary.stale,
        "monitor stopped"
    );
    Ok(())
}

/// Follows `cfg.file` and reports through `sink` until `shutdown` resolves or
/// the follower fails.
pub async fn run_monitor<F>(
    cfg: &MonitorConfig,
    sink: Arc<dyn StatsSink>,
    shutdown: F,
) -> anyhow::Result<IngestSummary>
where
    F: Future<Output = ()>,
{
    let stats = Arc::new(
        StatsManager::new(cfg.manager_params(sink)).context("invalid stats parameters")?,
    );

    let (lines, tail) = Tailer::new(&cfg.file, cfg.poll_interval())
        .start()
        .await
        .with_context(|| format!("cannot follow {}", cfg.file.display()))?;

    let monitor = LogMonitor::new(stats.clone());
    let (stop_tx, stop_rx) = watch::channel(false);

    stats.start();
    let mut ingest = tokio::spawn(monitor.run(lines, stop_rx));
    info!(file = %cfg.file.display(), "monitoring access log");

    // The ingest task only finishes early when the follower closes its channel.
    let finished = tokio::select! {
        _ = shutdown => None,
        finished = &mut ingest => Some(finished),
    };
    if finished.is_none() {
        info!("shutdown requested");
    }

    stop_tx.send_replace(true);
    tail.stop();
    stats.stop();

    let summary = match finished {
        Some(result) => result,
        None => ingest.await,
    };
    let followed = tail.wait().await;
    stats.wait().await;

    followed.context("log follower failed")?;
    summary.context("ingest task failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c, run until the follower exits");
        std::future::pending::<()>().await;
    }
}
