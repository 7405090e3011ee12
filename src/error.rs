//! Error types returned by the replica state machine and its log store.

use std::io;

use thiserror::Error;

use crate::message::ReplicaId;

/// A specialized `Result` for replica operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An error returned by a replica or its log store.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid construction arguments. Surfaced at creation or
    /// initialization; the replica must not be driven afterwards.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The log file failed, or its content is corrupted or truncated.
    /// Fatal: the host must stop driving the replica and recover the log
    /// out of band.
    #[error("log storage: {0}")]
    Storage(String),

    /// `submit` was called on a replica that is not the leader. Carries
    /// the best-known leader, if any, so the caller can redirect.
    #[error("not the leader (best-known leader: {leader:?})")]
    NotLeader {
        /// The replica believed to be the current leader.
        leader: Option<ReplicaId>,
    },

    /// An input method was handed a non-empty output bundle. This is a
    /// programming error in the host.
    #[error("output bundle was not empty on entry")]
    OutputMisuse,

    /// A `submit` payload does not match the configured fixed entry
    /// payload size.
    #[error("payload is {actual} bytes, the configured entry payload size is {expected}")]
    Payload {
        /// The payload size dictated by `log_entry_size`.
        expected: usize,
        /// The size of the payload that was submitted.
        actual: usize,
    },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
