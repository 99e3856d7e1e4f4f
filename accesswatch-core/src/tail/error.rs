use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("cannot open log file '{path}'")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read log file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log follower task failed")]
    Task(#[from] tokio::task::JoinError),
}
