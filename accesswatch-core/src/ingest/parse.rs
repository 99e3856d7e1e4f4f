use crate::ingest::error::ParseError;
use crate::ingest::types::AccessEvent;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;

pub const CLF_TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

// host logname user [timestamp] "method target protocol" status size ["referer" "agent"]
static CLF_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(\S+) (\S+) (\S+) \[([^\]]+)\] "(\S+) (\S+) ([^"\s]+)" (\S+) (\S+)(?: "([^"]*)" "([^"]*)")?\s*$"#,
    )
    .expect("access log pattern is valid")
});

/// Turns one raw log line into an [`AccessEvent`].
pub trait LineParser: Send + Sync {
    fn parse_line(&self, line: &str) -> Result<AccessEvent, ParseError>;
}

/// NCSA common and combined log format, as written by Apache httpd and nginx.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonLogParser;

impl CommonLogParser {
    pub fn new() -> Self {
        Self
    }
}

impl LineParser for CommonLogParser {
    fn parse_line(&self, line: &str) -> Result<AccessEvent, ParseError> {
        let Some(caps) = CLF_LINE.captures(line) else {
            return Err(ParseError::Malformed {
                line: line.to_string(),
            });
        };

        let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();

        let timestamp = DateTime::parse_from_str(field(4), CLF_TIMESTAMP_FORMAT).map_err(|e| {
            ParseError::Timestamp {
                value: field(4).to_string(),
                source: e,
            }
        })?;

        let status = field(8)
            .parse::<u16>()
            .map_err(|_| ParseError::Status {
                value: field(8).to_string(),
            })?;

        let size = match field(9) {
            "-" => 0,
            s => s.parse::<u64>().map_err(|_| ParseError::Size {
                value: s.to_string(),
            })?,
        };

        Ok(AccessEvent {
            remote_host: field(1).to_string(),
            remote_logname: field(2).to_string(),
            user: field(3).to_string(),
            timestamp,
            method: field(5).to_string(),
            path: field(6).to_string(),
            protocol: field(7).to_string(),
            status,
            size,
            referer: caps.get(10).map(|m| m.as_str().to_string()),
            user_agent: caps.get(11).map(|m| m.as_str().to_string()),
        })
    }
}
