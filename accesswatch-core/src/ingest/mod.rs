mod error;
mod monitor;
mod parse;
mod section;
mod types;


pub use error::{IngestError, ParseError, SectionError};
pub use monitor::{IngestSummary, LogMonitor};
pub use parse::{CLF_TIMESTAMP_FORMAT, CommonLogParser, LineParser};
pub use section::section_of;
pub use types::AccessEvent;
