//! Session state machine
//!
//! A [`Session`] holds the connection state, the agent endpoint and the
//! pairing code. Every mutation goes through a transition method that
//! checks the edge against [`ConnectionState::can_transition_to`], then
//! updates the fields and publishes the new state on a `watch` channel
//! under one lock.
//!
//! The session also counts *generations*: one per connected period. Frame
//! and metrics fetches capture the generation when they start and drop
//! their result if it changed by the time they finish.

use parking_lot::RwLock;
use tokio::sync::watch;

use md_core::{ConnectionState, Endpoint, PairingCode, PairingError, SessionError};

#[derive(Debug, Default)]
struct SessionInner {
    state: ConnectionState,
    endpoint: Option<Endpoint>,
    code: Option<PairingCode>,
    last_error: Option<String>,
    generation: u64,
}

/// Snapshot of a connected session, taken atomically
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub endpoint: Endpoint,
    pub code: PairingCode,
    pub generation: u64,
}

/// The single client session
#[derive(Debug)]
pub struct Session {
    inner: RwLock<SessionInner>,
    state_tx: watch::Sender<ConnectionState>,
}

impl Session {
    /// Create a disconnected session
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: RwLock::new(SessionInner::default()),
            state_tx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.read().state
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        self.inner.read().endpoint.clone()
    }

    pub fn pairing_code(&self) -> Option<PairingCode> {
        self.inner.read().code.clone()
    }

    /// Reason of the last failed pairing, kept while in `Error`
    pub fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Whether `generation` is still the connected period in force
    pub fn is_current(&self, generation: u64) -> bool {
        let inner = self.inner.read();
        inner.state.is_connected() && inner.generation == generation
    }

    /// Endpoint, code and generation if connected
    pub fn active(&self) -> Option<ActiveSession> {
        let inner = self.inner.read();
        if !inner.state.is_connected() {
            return None;
        }
        match (&inner.endpoint, &inner.code) {
            (Some(endpoint), Some(code)) => Some(ActiveSession {
                endpoint: endpoint.clone(),
                code: code.clone(),
                generation: inner.generation,
            }),
            _ => None,
        }
    }

    /// Remember an endpoint without changing state
    ///
    /// Ignored while connected so the live session keeps talking to the
    /// agent it paired with.
    pub fn set_endpoint(&self, endpoint: Endpoint) -> Result<(), SessionError> {
        let mut inner = self.inner.write();
        if matches!(
            inner.state,
            ConnectionState::Connected | ConnectionState::Connecting
        ) {
            return Err(SessionError::InvalidTransition {
                from: inner.state,
                to: inner.state,
            });
        }
        inner.endpoint = Some(endpoint);
        Ok(())
    }

    /// `Disconnected | Error -> Connecting`
    ///
    /// Returns the generation the attempt runs under; a disconnect during
    /// the attempt bumps it.
    pub fn begin_connecting(&self, endpoint: Endpoint) -> Result<u64, SessionError> {
        let generation = {
            let mut inner = self.inner.write();
            check_edge(inner.state, ConnectionState::Connecting)?;
            inner.state = ConnectionState::Connecting;
            inner.endpoint = Some(endpoint);
            inner.code = None;
            inner.last_error = None;
            self.publish(ConnectionState::Connecting);
            inner.generation
        };
        Ok(generation)
    }

    /// Whether the pairing attempt started under `generation` is still live
    pub fn is_connecting(&self, generation: u64) -> bool {
        let inner = self.inner.read();
        inner.state == ConnectionState::Connecting && inner.generation == generation
    }

    /// `Connecting -> Connected`, storing the approved code
    pub fn complete(&self, code: PairingCode) -> Result<u64, SessionError> {
        let generation = {
            let mut inner = self.inner.write();
            check_edge(inner.state, ConnectionState::Connected)?;
            inner.state = ConnectionState::Connected;
            inner.code = Some(code);
            inner.generation += 1;
            self.publish(ConnectionState::Connected);
            inner.generation
        };
        Ok(generation)
    }

    /// `Connecting -> Error`
    pub fn fail(&self, error: &PairingError) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.write();
            check_edge(inner.state, ConnectionState::Error)?;
            inner.state = ConnectionState::Error;
            inner.code = None;
            inner.last_error = Some(error.to_string());
            self.publish(ConnectionState::Error);
        }
        Ok(())
    }

    /// Any state but `Disconnected` -> `Disconnected`
    ///
    /// Clears the code, keeps the endpoint. Returns `false` (and publishes
    /// nothing) if already disconnected.
    pub fn disconnect(&self) -> bool {
        {
            let mut inner = self.inner.write();
            if inner.state == ConnectionState::Disconnected {
                return false;
            }
            inner.state = ConnectionState::Disconnected;
            inner.code = None;
            inner.last_error = None;
            inner.generation += 1;
            self.publish(ConnectionState::Disconnected);
        }
        true
    }

    /// Called with the write lock held so notifications follow transition order
    fn publish(&self, state: ConnectionState) {
        tracing::info!("Session state -> {}", state);
        self.state_tx.send_replace(state);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn check_edge(from: ConnectionState, to: ConnectionState) -> Result<(), SessionError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(SessionError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::parse("192.168.1.20").unwrap()
    }

    fn code() -> PairingCode {
        PairingCode::new("123456").unwrap()
    }

    #[test]
    fn test_full_lifecycle() {
        let session = Session::new();
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(session.active().is_none());

        session.begin_connecting(endpoint()).unwrap();
        assert_eq!(session.state(), ConnectionState::Connecting);
        assert!(session.active().is_none());

        let generation = session.complete(code()).unwrap();
        let active = session.active().unwrap();
        assert_eq!(active.code, code());
        assert_eq!(active.generation, generation);
        assert!(session.is_current(generation));

        assert!(session.disconnect());
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.pairing_code(), None);
        assert_eq!(session.endpoint(), Some(endpoint()));
        assert!(!session.is_current(generation));
    }

    #[test]
    fn test_no_error_to_connected_edge() {
        let session = Session::new();
        session.begin_connecting(endpoint()).unwrap();
        session
            .fail(&PairingError::Timeout { attempts: 45 })
            .unwrap();
        assert_eq!(session.state(), ConnectionState::Error);
        assert!(session.last_error().unwrap().contains("45"));

        let err = session.complete(code()).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                from: ConnectionState::Error,
                to: ConnectionState::Connected
            }
        );
        assert_eq!(session.state(), ConnectionState::Error);
    }

    #[test]
    fn test_cannot_connect_twice() {
        let session = Session::new();
        session.begin_connecting(endpoint()).unwrap();
        assert!(session.begin_connecting(endpoint()).is_err());
        session.complete(code()).unwrap();
        assert!(session.begin_connecting(endpoint()).is_err());
        assert_eq!(session.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_disconnect_when_disconnected_is_silent() {
        let session = Session::new();
        let mut rx = session.subscribe();
        let generation = session.generation();

        assert!(!session.disconnect());
        assert!(!rx.has_changed().unwrap());
        assert_eq!(session.generation(), generation);
    }

    #[test]
    fn test_transitions_notify_subscribers() {
        let session = Session::new();
        let mut rx = session.subscribe();

        session.begin_connecting(endpoint()).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), ConnectionState::Connecting);

        session.complete(code()).unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectionState::Connected);
    }

    #[test]
    fn test_retry_after_error_clears_last_error() {
        let session = Session::new();
        session.begin_connecting(endpoint()).unwrap();
        session
            .fail(&PairingError::Rejected {
                message: "Rejected".into(),
            })
            .unwrap();
        session.begin_connecting(endpoint()).unwrap();
        assert_eq!(session.last_error(), None);
    }

    #[test]
    fn test_set_endpoint_refused_while_connected() {
        let session = Session::new();
        session.begin_connecting(endpoint()).unwrap();
        session.complete(code()).unwrap();
        let other = Endpoint::parse("10.0.0.1").unwrap();
        assert!(session.set_endpoint(other).is_err());
        assert_eq!(session.endpoint(), Some(endpoint()));
    }
}
