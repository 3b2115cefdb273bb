//! Core error types for MirrorDesk

use std::path::PathBuf;

use md_protocol::FrameError;
use thiserror::Error;

use crate::types::ConnectionState;

/// Top-level error type for the MirrorDesk crates
#[derive(Error, Debug)]
pub enum MdError {
    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Pairing error
    #[error("Pairing failed: {0}")]
    Pairing(#[from] PairingError),

    /// Session error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures talking to the agent over HTTP
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The TCP connection could not be established
    #[error("could not connect: {0}")]
    Connect(String),

    /// The agent answered with a non-success status code
    #[error("agent returned HTTP {code}")]
    Status { code: u16 },

    /// The response body could not be decoded
    #[error("malformed response: {0}")]
    Decode(String),

    /// An endpoint URL could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Any other request failure
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether the agent could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        matches!(self, TransportError::Timeout | TransportError::Connect(_))
    }
}

/// Why a pairing attempt ended without a connected session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairingError {
    /// The agent refused the pairing request outright
    #[error("pairing request denied{}", fmt_detail(.message))]
    RequestDenied { message: Option<String> },

    /// The user rejected the request on the PC
    #[error("connection rejected by PC: {message}")]
    Rejected { message: String },

    /// No approval arrived within the polling window
    #[error("no approval after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// The pairing request itself could not be delivered
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The session was not in a state that allows pairing
    #[error("{0}")]
    InvalidState(#[from] SessionError),

    /// The session left `Connecting` while polling (user disconnected)
    #[error("pairing cancelled")]
    Cancelled,
}

fn fmt_detail(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {}", m),
        _ => String::new(),
    }
}

impl PairingError {
    /// A descriptive, actionable message for display to the user
    pub fn advice(&self) -> String {
        match self {
            PairingError::Transport(e) if e.is_unreachable() => format!(
                "Cannot reach the PC ({}).\n\n\
                 Make sure:\n\
                 - The PC app is running\n\
                 - The IP address is correct\n\
                 - Both devices are on the same Wi-Fi network\n\
                 - Port 8000 is not blocked by a firewall",
                e
            ),
            PairingError::Transport(e) => format!(
                "Network error: {}\n\n\
                 Check:\n\
                 - The PC IP address\n\
                 - Your Wi-Fi connection\n\
                 - Firewall settings on the PC",
                e
            ),
            PairingError::RequestDenied { .. } => format!(
                "Connection failed ({}).\n\n\
                 Possible issues:\n\
                 - Wrong connection code\n\
                 - The code on the PC has expired\n\
                 - A network firewall is blocking the request",
                self
            ),
            PairingError::Rejected { .. } => {
                "The connection was rejected on the PC.\n\n\
                 Accept the request in the PC app and try again."
                    .to_string()
            }
            PairingError::Timeout { .. } => {
                "The PC did not approve the connection in time.\n\n\
                 Check the PC for a pending connection request and try again."
                    .to_string()
            }
            PairingError::InvalidState(e) => format!("{}. Disconnect first and retry.", e),
            PairingError::Cancelled => "Pairing was cancelled.".to_string(),
        }
    }
}

/// Session state machine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The requested transition is not an edge of the state machine
    #[error("cannot go from {from} to {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
}

/// Invalid values supplied by the user or a QR code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Pairing codes are exactly six ASCII digits
    #[error("pairing code must be 6 digits (got '{0}')")]
    InvalidCode(String),

    /// The host or URL cannot be turned into an agent endpoint
    #[error("invalid agent address '{0}'")]
    InvalidEndpoint(String),

    /// Connecting by code alone before any agent address was set
    #[error("no agent address set")]
    MissingEndpoint,

    /// A scanned QR payload matched none of the known formats
    #[error("unrecognized pairing payload '{0}'")]
    UnrecognizedTarget(String),
}

/// Image decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The data URL was malformed or its base64 invalid
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// No bytes to decode
    #[error("empty image data")]
    Empty,

    /// The bytes match no supported image format
    #[error("unsupported image format")]
    UnsupportedFormat,

    /// The header is cut short or inconsistent
    #[error("corrupt {format} image: {reason}")]
    Corrupt {
        format: &'static str,
        reason: String,
    },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_denied_display() {
        let err = PairingError::RequestDenied {
            message: Some("invalid code".to_string()),
        };
        assert_eq!(err.to_string(), "pairing request denied: invalid code");

        let err = PairingError::RequestDenied { message: None };
        assert_eq!(err.to_string(), "pairing request denied");
    }

    #[test]
    fn test_unreachable_advice_mentions_causes() {
        let err = PairingError::Transport(TransportError::Connect("refused".to_string()));
        let advice = err.advice();
        assert!(advice.contains("IP address"));
        assert!(advice.contains("Wi-Fi"));
        assert!(advice.contains("firewall"));
    }

    #[test]
    fn test_request_denied_advice_mentions_code() {
        let advice = PairingError::RequestDenied { message: None }.advice();
        assert!(advice.contains("Wrong connection code"));
    }

    #[test]
    fn test_md_error_wraps_session_error() {
        let err: MdError = SessionError::InvalidTransition {
            from: ConnectionState::Connected,
            to: ConnectionState::Connecting,
        }
        .into();
        assert!(matches!(err, MdError::Session(_)));
        assert_eq!(
            err.to_string(),
            "Session error: cannot go from connected to connecting"
        );
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = SessionError::InvalidTransition {
            from: ConnectionState::Error,
            to: ConnectionState::Connected,
        };
        assert_eq!(err.to_string(), "cannot go from error to connected");
    }
}
