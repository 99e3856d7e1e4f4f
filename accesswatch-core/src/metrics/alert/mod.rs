mod event;
mod monitor;
mod state;


pub use event::{AlertEvent, AlertKind};
pub use monitor::{AlertMonitor, AlertParams};
pub use state::{AlertState, ThresholdAlert};
