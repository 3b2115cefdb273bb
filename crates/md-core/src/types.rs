//! Core domain types

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{InputError, TransportError};

/// Port the PC agent listens on unless told otherwise
pub const DEFAULT_AGENT_PORT: u16 = 8000;

/// Lifecycle of the single client session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No session; initial state
    #[default]
    Disconnected,
    /// Pairing in progress
    Connecting,
    /// Paired and approved by the PC
    Connected,
    /// The last pairing attempt failed
    Error,
}

impl ConnectionState {
    /// Whether `next` is an edge of the session state machine
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected | Error, Connecting)
                | (Connecting, Connected)
                | (Connecting, Error)
                | (Connecting | Connected | Error, Disconnected)
        )
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Error => write!(f, "error"),
        }
    }
}

/// A 6-digit pairing code generated by the agent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairingCode(String);

impl PairingCode {
    /// Validate and wrap a pairing code. Surrounding whitespace is ignored.
    pub fn new(code: &str) -> Result<Self, InputError> {
        let code = code.trim();
        if code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(code.to_string()))
        } else {
            Err(InputError::InvalidCode(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PairingCode {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Base URL of a PC agent
///
/// Always absolute, `http` or `https`, with a path ending in `/` so that
/// API paths join beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Normalise user input into an endpoint on the default agent port.
    ///
    /// - `http://...` / `https://...` is used as given
    /// - `host:port` keeps its port
    /// - a bare host becomes `http://<host>:8000`
    pub fn parse(input: &str) -> Result<Self, InputError> {
        Self::parse_with_port(input, DEFAULT_AGENT_PORT)
    }

    /// Like [`Endpoint::parse`] with a different default port
    pub fn parse_with_port(input: &str, default_port: u16) -> Result<Self, InputError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InputError::InvalidEndpoint(input.to_string()));
        }

        let raw = if trimmed.contains("://") {
            trimmed.to_string()
        } else if has_explicit_port(trimmed) {
            format!("http://{}", trimmed)
        } else {
            format!("http://{}:{}", trimmed, default_port)
        };

        let mut url =
            Url::parse(&raw).map_err(|_| InputError::InvalidEndpoint(trimmed.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(InputError::InvalidEndpoint(trimmed.to_string()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self(url))
    }

    /// Resolve an API path (e.g. `connection/request`) against this endpoint
    pub fn join(&self, path: &str) -> Result<Url, TransportError> {
        self.0
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{}{}: {}", self.0, path, e)))
    }

    /// The agent's origin (`GET /`), ignoring any base path
    pub fn root(&self) -> Url {
        let mut url = self.0.clone();
        url.set_path("/");
        url
    }

    /// Host name or IP address of the agent
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> Option<u16> {
        self.0.port_or_known_default()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str().trim_end_matches('/'))
    }
}

impl FromStr for Endpoint {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `host:1234` or `[::1]:1234`, but not a bare IPv6 address
fn has_explicit_port(host: &str) -> bool {
    match host.rsplit_once(':') {
        Some((name, port)) => {
            let name_ok = !name.is_empty() && (!name.contains(':') || name.ends_with(']'));
            name_ok && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}
