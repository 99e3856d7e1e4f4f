use crate::ingest::error::IngestError;
use crate::ingest::parse::{CommonLogParser, LineParser};
use crate::ingest::section::section_of;
use crate::ingest::types::AccessEvent;
use crate::metrics::StatsManager;
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Line counts for one ingestion run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub accepted: u64,
    pub malformed: u64,
    pub stale: u64,
}

/// Feeds parsed access-log lines into the stats manager.
///
/// Lines dated before the monitor was created are dropped, so replaying a
/// file's history never shows up as live traffic.
pub struct LogMonitor {
    parser: Box<dyn LineParser>,
    stats: Arc<StatsManager>,
    started_at: DateTime<Utc>,
}

impl LogMonitor {
    /// Log timestamps have whole-second precision, so lines from the second
    /// the monitor starts in still count as live.
    pub fn new(stats: Arc<StatsManager>) -> Self {
        let started_at = Utc::now().trunc_subsecs(0);
        Self::with_parser(stats, Box::new(CommonLogParser::new()), started_at)
    }

    pub fn with_parser(
        stats: Arc<StatsManager>,
        parser: Box<dyn LineParser>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            parser,
            stats,
            started_at,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Parses and date-checks a line without observing it.
    pub fn check_line(&self, line: &str) -> Result<(AccessEvent, String), IngestError> {
        let event = self.parser.parse_line(line)?;

        if event.timestamp < self.started_at {
            return Err(IngestError::Stale {
                logged_at: event.timestamp,
                started_at: self.started_at,
            });
        }

        let section = section_of(&event.path)?;
        Ok((event, section))
    }

    /// Checks a line and, if it is live, records it in every statistic.
    pub fn ingest(&self, line: &str) -> Result<(), IngestError> {
        let (event, section) = self.check_line(line)?;

        self.stats.observe_request();
        self.stats.observe_section(&section);
        self.stats.observe_status_code(event.status);
        if !event.is_anonymous() {
            self.stats.observe_user(&event.user);
        }

        Ok(())
    }

    /// Consumes lines until the follower closes the channel or `stop` fires.
    pub async fn run(
        self,
        mut lines: mpsc::Receiver<String>,
        mut stop: watch::Receiver<bool>,
    ) -> IngestSummary {
        let mut summary = IngestSummary::default();

        loop {
            tokio::select! {
                line = lines.recv() => {
                    let Some(line) = line else {
                        info!("log follower closed, exiting monitor");
                        break;
                    };
                    self.record(&line, &mut summary);
                }
                _ = stop.changed() => {
                    info!("exiting monitor");
                    break;
                }
            }
        }

        summary
    }

    fn record(&self, line: &str, summary: &mut IngestSummary) {
        match self.ingest(line) {
            Ok(()) => summary.accepted += 1,
            Err(e @ IngestError::Stale { .. }) => {
                summary.stale += 1;
                debug!(error = %e, "skipping stale line");
            }
            Err(e) => {
                summary.malformed += 1;
                warn!(error = %e, "discarding log line");
            }
        }
    }
}
