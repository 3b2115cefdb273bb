//! Request and response bodies of the agent HTTP API
//!
//! The agent listens on port 8000 by default and exposes:
//!
//! | Endpoint | Body type |
//! |---|---|
//! | `GET /` | [`ProbeResponse`] |
//! | `POST connection/request` | [`ConnectionRequest`] → [`ConnectionResponse`] |
//! | `GET connection/status/{code}` | [`ConnectionStatusResponse`] |
//! | `GET mobile/screen` | plain-text data URL (see [`crate::frame`]) |
//! | `POST mobile/execute-command` | [`CommandRequest`] → [`CommandResponse`] |
//! | `GET system-metrics` | [`SystemMetricsResponse`] |
//!
//! Every endpoint after pairing expects the pairing code in the
//! [`CONNECTION_CODE_HEADER`] header.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Header carrying the pairing code on authenticated endpoints
pub const CONNECTION_CODE_HEADER: &str = "x-connection-code";

/// Response of the liveness probe (`GET /`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub status: String,
}

/// Pairing request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    /// The 6-digit pairing code shown on the PC
    pub code: String,
    /// Human-readable label of this device, shown in the agent's approval prompt
    pub device_info: String,
}

impl ConnectionRequest {
    pub fn new(code: impl Into<String>, device_info: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            device_info: device_info.into(),
        }
    }
}

/// Response to a pairing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub success: bool,
    #[serde(default)]
    pub request_id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `GET connection/status/{code}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatusResponse {
    /// True once the user approved the request on the PC
    pub active: bool,
    #[serde(default)]
    pub message: String,
}

impl ConnectionStatusResponse {
    /// Whether the agent reports that the request was rejected.
    ///
    /// Agents phrase this differently ("Rejected", "connection rejected by
    /// user"), so the check is a case-insensitive substring match.
    pub fn is_rejected(&self) -> bool {
        self.message.to_ascii_lowercase().contains("rejected")
    }
}

/// Command envelope posted to `mobile/execute-command`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl CommandRequest {
    pub fn new(kind: impl Into<String>, data: HashMap<String, String>) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

/// Result of a command execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Free-form information some commands attach (e.g. `system_command info`)
    #[serde(default)]
    pub system_info: Option<BTreeMap<String, serde_json::Value>>,
}

/// Response of `GET system-metrics`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMetricsResponse {
    pub cpu: String,
    pub ram: String,
    pub net: String,
}
