pub mod monitor;
pub mod tracing;

pub use monitor::{TestMonitor, access_line, test_config};
pub use tracing::{CapturedEvent, events, init_test_tracing, wait_for_event};
