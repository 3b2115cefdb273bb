//! Pairing negotiation
//!
//! The flow:
//! 1. Optionally probe `GET /` (failure is only logged)
//! 2. Submit the pairing request with this device's label
//! 3. Poll `connection/status/{code}` until the user approves or rejects
//!    the request on the PC, or the attempts run out
//!
//! The negotiator drives the session through `Connecting` and into
//! `Connected` or `Error`. If the session leaves `Connecting` while the
//! negotiator is polling, the attempt is abandoned as cancelled and the
//! session is left alone.

use std::sync::Arc;

use md_core::config::PairingConfig;
use md_core::{AgentTransport, Endpoint, PairingCode, PairingError};
use md_protocol::ConnectionRequest;

use crate::session::Session;

/// Runs the pairing handshake against one agent
pub struct PairingNegotiator {
    transport: Arc<dyn AgentTransport>,
    config: PairingConfig,
    device_label: String,
}

impl PairingNegotiator {
    /// Create a negotiator
    pub fn new(
        transport: Arc<dyn AgentTransport>,
        config: PairingConfig,
        device_label: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            config,
            device_label: device_label.into(),
        }
    }

    pub fn config(&self) -> &PairingConfig {
        &self.config
    }

    /// Pair `session` with the agent at `endpoint` using `code`
    ///
    /// Fails fast with [`PairingError::InvalidState`] if the session is
    /// already connecting or connected.
    pub async fn negotiate(
        &self,
        session: &Session,
        endpoint: Endpoint,
        code: PairingCode,
    ) -> Result<(), PairingError> {
        let attempt = session.begin_connecting(endpoint.clone())?;
        tracing::info!("Pairing with {} using code {}", endpoint, code);

        match self.handshake(session, attempt, &endpoint, &code).await {
            Ok(()) => {
                if !session.is_connecting(attempt) {
                    return Err(PairingError::Cancelled);
                }
                session
                    .complete(code)
                    .map_err(|_| PairingError::Cancelled)?;
                tracing::info!("Paired with {}", endpoint);
                Ok(())
            }
            Err(PairingError::Cancelled) => {
                tracing::info!("Pairing with {} cancelled", endpoint);
                Err(PairingError::Cancelled)
            }
            Err(e) => {
                if !session.is_connecting(attempt) {
                    return Err(PairingError::Cancelled);
                }
                tracing::error!("Pairing with {} failed: {}", endpoint, e);
                session.fail(&e).map_err(|_| PairingError::Cancelled)?;
                Err(e)
            }
        }
    }

    async fn handshake(
        &self,
        session: &Session,
        attempt: u64,
        endpoint: &Endpoint,
        code: &PairingCode,
    ) -> Result<(), PairingError> {
        if self.config.probe {
            match self.transport.probe(endpoint).await {
                Ok(probe) => tracing::debug!("Agent at {} is up: {}", endpoint, probe.status),
                Err(e) => tracing::warn!("Probe of {} failed, trying anyway: {}", endpoint, e),
            }
        }

        let request = ConnectionRequest::new(code.as_str(), self.device_label.as_str());
        let response = self.transport.request_connection(endpoint, &request).await?;
        if !response.success {
            return Err(PairingError::RequestDenied {
                message: response.message,
            });
        }
        if let Some(id) = response.request_id {
            tracing::debug!("Pairing request {} accepted, awaiting approval", id);
        }

        self.await_approval(session, attempt, endpoint, code).await
    }

    async fn await_approval(
        &self,
        session: &Session,
        attempt: u64,
        endpoint: &Endpoint,
        code: &PairingCode,
    ) -> Result<(), PairingError> {
        let max = self.config.max_attempts;
        let mut state_rx = session.subscribe();

        for poll in 1..=max {
            if !session.is_connecting(attempt) {
                return Err(PairingError::Cancelled);
            }

            match self.transport.connection_status(endpoint, code).await {
                Ok(status) if status.active => {
                    tracing::debug!("Approved after {} status checks", poll);
                    return Ok(());
                }
                Ok(status) if status.is_rejected() => {
                    return Err(PairingError::Rejected {
                        message: status.message,
                    });
                }
                Ok(status) => {
                    tracing::debug!("Waiting for approval ({}/{}): {}", poll, max, status.message)
                }
                Err(e) => tracing::warn!("Status check {}/{} failed: {}", poll, max, e),
            }

            if poll < max {
                // A state change (disconnect) cuts the wait short
                state_rx.borrow_and_update();
                tokio::select! {
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                    _ = state_rx.changed() => {}
                }
            }
        }

        Err(PairingError::Timeout { attempts: max })
    }
}
