//! Errors that end an invocation before any output is captured.

use thiserror::Error;

/// Failure before a session exists.
///
/// Anything that goes wrong once the child is running is reported through
/// [`Outcome`](crate::Outcome) instead, together with the partial transcript.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid combination of flags, delimiters or steps. Nothing was spawned.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The executable could not be found or the OS refused to start it.
    #[error("failed to spawn '{program}'")]
    Spawn {
        /// `argv[0]` of the command that failed.
        program: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
