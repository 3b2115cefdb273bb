//! Protocol error types

use thiserror::Error;

/// Errors raised while building commands from user values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A command value is outside its allowed range
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

/// Errors raised while parsing or decoding a data-URL frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The agent returned an empty body
    #[error("empty frame")]
    Empty,

    /// The body does not start with `data:image`
    #[error("missing data:image prefix (got {preview:?})")]
    MissingPrefix { preview: String },

    /// No `base64,` marker, or nothing after it
    #[error("no base64 payload after prefix")]
    MissingPayload,

    /// The payload is not valid base64
    #[error("invalid base64 payload: {0}")]
    Base64(String),
}
