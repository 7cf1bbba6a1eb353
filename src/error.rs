//! Error types for linepipe.

use thiserror::Error;

/// Main error type for all line pipe operations.
#[derive(Debug, Error)]
pub enum PipeError {
    /// I/O error on the input or output side of a transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Child process could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that was being spawned.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Transport was used after it was closed.
    #[error("transport closed")]
    Closed,

    /// Configuration rejected by [`PipeConfig::validate`](crate::PipeConfig::validate).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipeError {
    /// Map a transport error, recognising the closed-transport marker.
    pub(crate) fn from_transport(err: std::io::Error) -> Self {
        let closed = err
            .get_ref()
            .is_some_and(|inner| inner.is::<crate::transport::ClosedMarker>());
        if closed {
            PipeError::Closed
        } else {
            PipeError::Io(err)
        }
    }
}

/// Result type alias using PipeError.
pub type Result<T> = std::result::Result<T, PipeError>;
