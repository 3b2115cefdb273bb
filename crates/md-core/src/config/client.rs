//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::{duration_millis, duration_secs};
use crate::types::DEFAULT_AGENT_PORT;

/// Identifier sent as `User-Agent` on every request
const DEFAULT_CLIENT_ID: &str = "MirrorDesk-Mobile/1.0";

/// Configuration for the MirrorDesk client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Agent host used when a command is given none
    pub default_host: Option<String>,

    /// Port appended to bare hosts
    pub default_port: u16,

    /// Label shown in the PC's approval prompt (defaults to hostname)
    pub device_label: String,

    /// Client identifier sent as `User-Agent`
    pub client_id: String,

    /// Connect and overall request timeout
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    /// Pairing handshake settings
    pub pairing: PairingConfig,

    /// Screen streaming settings
    pub stream: StreamConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_host: None,
            default_port: DEFAULT_AGENT_PORT,
            device_label: gethostname::gethostname().to_string_lossy().into_owned(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            request_timeout: Duration::from_secs(15),
            pairing: PairingConfig::default(),
            stream: StreamConfig::default(),
        }
    }
}

/// Approval polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Delay between status polls
    #[serde(rename = "poll_interval_ms", with = "duration_millis")]
    pub poll_interval: Duration,

    /// Status polls before giving up
    pub max_attempts: u32,

    /// Probe `GET /` before requesting pairing (failure is only logged)
    pub probe: bool,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_attempts: 45,
            probe: true,
        }
    }
}

/// Screen stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Delay between frame fetches
    #[serde(rename = "interval_ms", with = "duration_millis")]
    pub interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
        }
    }
}
