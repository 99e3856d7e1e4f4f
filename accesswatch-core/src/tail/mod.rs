mod error;
mod follower;

#[cfg(test)]
mod tests;

pub use error::FollowError;
pub use follower::{TailHandle, Tailer};
