//! Error types for the replay service.
//!
//! [`TransportError`] and [`ProtocolError`] are handled inside the serve
//! loop and never reach the caller of
//! [`spawn_visualization`](crate::startup::spawn_visualization): a
//! transport error drops the connection or listener and reopens it, and a
//! protocol error is answered with `ERROR`.

/// Failures of the byte stream underneath the protocol.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The socket failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A message announced more parts than the limit allows.
    #[error("message has {parts} parts, limit is {max}")]
    TooManyParts {
        /// Announced part count.
        parts: u32,
        /// The limit.
        max: u32,
    },

    /// A part announced more bytes than the limit allows.
    #[error("message part of {len} bytes exceeds limit of {max}")]
    PartTooLarge {
        /// Announced length.
        len: u32,
        /// The limit.
        max: u32,
    },

    /// The peer closed the connection in the middle of a message.
    #[error("connection closed mid-message")]
    Truncated,
}

/// A well-framed message that is not a valid request or reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The message had no parts.
    #[error("empty message")]
    Empty,

    /// The command word is not recognized.
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    /// `GET` without an index.
    #[error("GET requires a step index")]
    MissingIndex,

    /// The step index is not a non-negative decimal number.
    #[error("invalid step index `{0}`")]
    InvalidIndex(String),

    /// The service answered with something other than `OK` or `ERROR`.
    #[error("unexpected reply `{0}`")]
    UnexpectedReply(String),
}

/// Errors returned by [`VisualizationClient`](crate::client::VisualizationClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The connection failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The reply could not be understood.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The service answered `ERROR`.
    #[error("request rejected by the service")]
    Rejected,

    /// The service closed the connection without replying.
    #[error("service closed the connection")]
    Closed,
}

impl From<std::io::Error> for ClientError {
    fn from(source: std::io::Error) -> Self {
        Self::Transport(TransportError::Io { source })
    }
}
