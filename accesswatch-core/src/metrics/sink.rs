use crate::metrics::alert::AlertEvent;
use crate::metrics::render::{render_alert, render_stats};
use crate::metrics::snapshot::StatsSnapshot;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use tokio::sync::mpsc;
use tracing::warn;

/// Destination for everything the stats manager reports.
///
/// Called from the manager's event loop, one call at a time. Implementations
/// must not block for long: the loop does nothing else while a sink runs.
pub trait StatsSink: Send + Sync {
    fn on_stats(&self, snapshot: &StatsSnapshot);
    fn on_alert(&self, event: &AlertEvent);
}

/// Human-readable report on stdout.
pub struct ConsoleSink {
    colored: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            colored: io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { colored: false }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSink for ConsoleSink {
    fn on_stats(&self, snapshot: &StatsSnapshot) {
        print!("{}", render_stats(snapshot));
        let _ = io::stdout().flush();
    }

    fn on_alert(&self, event: &AlertEvent) {
        println!("{}", render_alert(event, self.colored));
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonRecord<'a> {
    Stats(&'a StatsSnapshot),
    Alert(&'a AlertEvent),
}

/// One JSON object per line on stdout, for piping into other tools.
#[derive(Default)]
pub struct JsonSink;

impl JsonSink {
    fn emit(&self, record: &JsonRecord<'_>) {
        match serde_json::to_string(record) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "failed to serialize report record"),
        }
    }
}

impl StatsSink for JsonSink {
    fn on_stats(&self, snapshot: &StatsSnapshot) {
        self.emit(&JsonRecord::Stats(snapshot));
    }

    fn on_alert(&self, event: &AlertEvent) {
        self.emit(&JsonRecord::Alert(event));
    }
}

#[derive(Debug, Clone)]
pub enum SinkEvent {
    Stats(StatsSnapshot),
    Alert(AlertEvent),
}

/// Forwards reports into a channel so they can be consumed programmatically.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatsSink for ChannelSink {
    fn on_stats(&self, snapshot: &StatsSnapshot) {
        // Receiver gone means nobody is listening anymore.
        let _ = self.tx.send(SinkEvent::Stats(snapshot.clone()));
    }

    fn on_alert(&self, event: &AlertEvent) {
        let _ = self.tx.send(SinkEvent::Alert(event.clone()));
    }
}
