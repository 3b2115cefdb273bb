//! Transport trait

use async_trait::async_trait;

use md_protocol::{
    CommandRequest, CommandResponse, ConnectionRequest, ConnectionResponse,
    ConnectionStatusResponse, ProbeResponse, SystemMetricsResponse,
};

use crate::error::TransportError;
use crate::types::{Endpoint, PairingCode};

/// Calls against a PC agent's HTTP API
///
/// Implementations are stateless per call and must be safe to use from
/// several tasks at once: the stream loop, manual refreshes and pairing
/// polls share one instance.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// `GET /`
    async fn probe(&self, endpoint: &Endpoint) -> Result<ProbeResponse, TransportError>;

    /// `POST connection/request`
    async fn request_connection(
        &self,
        endpoint: &Endpoint,
        request: &ConnectionRequest,
    ) -> Result<ConnectionResponse, TransportError>;

    /// `GET connection/status/{code}`
    async fn connection_status(
        &self,
        endpoint: &Endpoint,
        code: &PairingCode,
    ) -> Result<ConnectionStatusResponse, TransportError>;

    /// `GET mobile/screen`, returning the raw body text
    async fn screen(&self, endpoint: &Endpoint, code: &PairingCode)
        -> Result<String, TransportError>;

    /// `POST mobile/execute-command`
    async fn execute_command(
        &self,
        endpoint: &Endpoint,
        code: &PairingCode,
        request: &CommandRequest,
    ) -> Result<CommandResponse, TransportError>;

    /// `GET system-metrics`
    async fn system_metrics(
        &self,
        endpoint: &Endpoint,
        code: &PairingCode,
    ) -> Result<SystemMetricsResponse, TransportError>;
}
