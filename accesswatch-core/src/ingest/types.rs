use chrono::{DateTime, FixedOffset};

/// One access-log line, parsed.
///
/// See https://www.w3.org/Daemon/User/Config/Logging.html#common-logfile-format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    pub remote_host: String,
    pub remote_logname: String,
    /// Authenticated user, `-` when anonymous.
    pub user: String,
    pub timestamp: DateTime<FixedOffset>,
    pub method: String,
    /// Request target as written in the request line, query included.
    pub path: String,
    pub protocol: String,
    pub status: u16,
    /// Response body size; `-` in the log is read as 0.
    pub size: u64,

    // Combined log format only
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl AccessEvent {
    pub fn is_anonymous(&self) -> bool {
        self.user.is_empty() || self.user == "-"
    }
}
