use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("malformed access log line: {line:?}")]
    Malformed { line: String },

    #[error("invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid status code '{value}'")]
    Status { value: String },

    #[error("invalid response size '{value}'")]
    Size { value: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum SectionError {
    #[error("cannot get section from an empty path")]
    Empty,

    #[error("cannot get section from path '{path}': path must start with '/'")]
    Relative { path: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("error parsing line: {0}")]
    Parse(#[from] ParseError),

    #[error("error deriving section: {0}")]
    Section(#[from] SectionError),

    /// Not a parse failure: the line is well formed but predates the monitor.
    #[error("old log line detected. log time: {logged_at}, monitor start time: {started_at}")]
    Stale {
        logged_at: DateTime<FixedOffset>,
        started_at: DateTime<Utc>,
    },
}
