pub mod alert;
pub mod constants;
mod error;
pub mod lifecycle;
mod manager;
pub mod rate;
mod render;
mod sink;
mod snapshot;
pub mod topk;

#[cfg(test)]
mod tests;

pub use error::MetricsError;
pub use manager::{ManagerParams, StatsManager, is_error_status};
pub use render::{render_alert, render_stats};
pub use sink::{ChannelSink, ConsoleSink, JsonSink, SinkEvent, StatsSink};
pub use snapshot::StatsSnapshot;
