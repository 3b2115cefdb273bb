//! Connection manager
//!
//! The one object a front end talks to. It owns the session, the latest
//! frame and metrics, and the stream loop, and exposes them as `watch`
//! receivers. Construct it once per process and share it as
//! `Arc<ConnectionManager>`.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use md_core::config::ClientConfig;
use md_core::{
    AgentTransport, ConnectionState, Endpoint, ImageDecoder, InputError, MdError, PairingCode,
    PairingError, PairingTarget,
};
use md_protocol::{MouseButton, RemoteCommand};

use crate::commands::CommandDispatcher;
use crate::decode::HeaderDecoder;
use crate::metrics::{Metrics, MetricsMonitor};
use crate::pairing::PairingNegotiator;
use crate::session::Session;
use crate::stream::{FetchOutcome, Frame, ScreenFetcher, ScreenStream, StreamStatsSnapshot};
use crate::transport::HttpTransport;

/// Owner of the client session and everything hanging off it
pub struct ConnectionManager {
    config: ClientConfig,
    session: Arc<Session>,
    transport: Arc<dyn AgentTransport>,
    negotiator: PairingNegotiator,
    fetcher: Arc<ScreenFetcher>,
    stream: ScreenStream,
    dispatcher: CommandDispatcher,
    metrics: MetricsMonitor,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    /// Create a manager talking HTTP, with the header-only decoder
    pub fn new(config: ClientConfig) -> Result<Self, MdError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_parts(
            config,
            Arc::new(transport),
            Arc::new(HeaderDecoder::new()),
        ))
    }

    /// Create a manager from explicit transport and decoder implementations
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn AgentTransport>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        let session = Arc::new(Session::new());
        let negotiator = PairingNegotiator::new(
            Arc::clone(&transport),
            config.pairing.clone(),
            config.device_label.clone(),
        );
        let fetcher = Arc::new(ScreenFetcher::new(
            Arc::clone(&session),
            Arc::clone(&transport),
            decoder,
        ));
        let stream = ScreenStream::new(Arc::clone(&fetcher), config.stream.interval);
        let dispatcher = CommandDispatcher::new(Arc::clone(&session), Arc::clone(&transport));
        let metrics = MetricsMonitor::new(Arc::clone(&session), Arc::clone(&transport));

        Self {
            config,
            session,
            transport,
            negotiator,
            fetcher,
            stream,
            dispatcher,
            metrics,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.session.subscribe()
    }

    /// Endpoint of the current or last session
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.session.endpoint()
    }

    pub fn pairing_code(&self) -> Option<PairingCode> {
        self.session.pairing_code()
    }

    /// Why the last pairing failed, while in `Error`
    pub fn last_error(&self) -> Option<String> {
        self.session.last_error()
    }

    pub fn frames(&self) -> watch::Receiver<Frame> {
        self.fetcher.subscribe()
    }

    pub fn latest_frame(&self) -> Frame {
        self.fetcher.latest()
    }

    pub fn metrics(&self) -> watch::Receiver<Metrics> {
        self.metrics.subscribe()
    }

    pub fn latest_metrics(&self) -> Metrics {
        self.metrics.latest()
    }

    /// Normalise `host` with the configured default port
    pub fn resolve_endpoint(&self, host: &str) -> Result<Endpoint, MdError> {
        Ok(Endpoint::parse_with_port(host, self.config.default_port)?)
    }

    /// Remember `host` as the endpoint to pair with, without connecting
    pub fn update_endpoint(&self, host: &str) -> Result<Endpoint, MdError> {
        let endpoint = self.resolve_endpoint(host)?;
        self.session.set_endpoint(endpoint.clone())?;
        Ok(endpoint)
    }

    /// Probe `host` without touching the session
    pub async fn test_connection(&self, host: &str) -> bool {
        let endpoint = match self.resolve_endpoint(host) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::warn!("Cannot test {}: {}", host, e);
                return false;
            }
        };
        match self.transport.probe(&endpoint).await {
            Ok(probe) => {
                tracing::info!("Agent at {} is reachable ({})", endpoint, probe.status);
                true
            }
            Err(e) => {
                tracing::warn!("Agent at {} is not reachable: {}", endpoint, e);
                false
            }
        }
    }

    /// Pair with `host` using a 6-digit `code`
    pub async fn connect(&self, host: &str, code: &str) -> Result<(), MdError> {
        let endpoint = self.resolve_endpoint(host)?;
        let code = PairingCode::new(code)?;
        self.pair(endpoint, code).await?;
        Ok(())
    }

    /// Pair with the endpoint set by [`ConnectionManager::update_endpoint`]
    pub async fn connect_with_code(&self, code: &str) -> Result<(), MdError> {
        let code = PairingCode::new(code)?;
        let endpoint = self
            .session
            .endpoint()
            .ok_or(InputError::MissingEndpoint)?;
        self.pair(endpoint, code).await?;
        Ok(())
    }

    /// Pair with a target decoded from a QR code
    pub async fn connect_target(&self, target: &PairingTarget) -> Result<(), MdError> {
        let endpoint = self.resolve_endpoint(&target.host)?;
        self.pair(endpoint, target.code.clone()).await?;
        Ok(())
    }

    /// Run the pairing handshake
    pub async fn pair(&self, endpoint: Endpoint, code: PairingCode) -> Result<(), PairingError> {
        self.negotiator.negotiate(&self.session, endpoint, code).await
    }

    /// End the session
    ///
    /// Stops the stream, clears the code (the endpoint is kept) and resets
    /// frame and metrics. Returns `false` if already disconnected.
    pub fn disconnect(&self) -> bool {
        self.stream.stop();
        if !self.session.disconnect() {
            return false;
        }
        self.fetcher.reset();
        self.metrics.reset();
        tracing::info!("Disconnected");
        true
    }

    /// Fetch one frame now, alongside any running stream
    pub async fn fetch_screen(&self) -> FetchOutcome {
        self.fetcher.fetch().await
    }

    /// Start the stream loop; `false` if already running
    pub fn start_stream(&self) -> bool {
        self.stream.start()
    }

    /// Stop the stream loop; `false` if not running
    pub fn stop_stream(&self) -> bool {
        self.stream.stop()
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_running()
    }

    pub fn stream_stats(&self) -> StreamStatsSnapshot {
        self.stream.stats()
    }

    /// Start the stream whenever the session connects and stop it otherwise
    ///
    /// The task holds only a weak reference and ends when the manager is
    /// dropped.
    pub fn spawn_state_reactor(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        let state_rx = self.subscribe_state();
        let shutdown = self.shutdown.clone();
        tokio::spawn(react_to_state(manager, state_rx, shutdown))
    }

    /// Fetch PC metrics now; `false` if not connected
    pub async fn fetch_metrics(&self) -> bool {
        self.metrics.fetch().await
    }

    pub async fn execute(&self, kind: &str, data: HashMap<String, String>) -> String {
        self.dispatcher.execute(kind, data).await
    }

    pub async fn send(&self, command: RemoteCommand) -> String {
        self.dispatcher.send(command).await
    }

    pub async fn send_mouse_click(&self, button: MouseButton) -> String {
        self.dispatcher.send_mouse_click(button).await
    }

    pub async fn send_keyboard_shortcut(&self, shortcut: &str) -> String {
        self.dispatcher.send_keyboard_shortcut(shortcut).await
    }

    pub async fn send_system_command(&self, command: &str) -> String {
        self.dispatcher.send_system_command(command).await
    }

    pub async fn open_app(&self, app_name: &str) -> String {
        self.dispatcher.open_app(app_name).await
    }

    /// Stop background work and disconnect
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.disconnect();
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.stream.stop();
    }
}

async fn react_to_state(
    manager: Weak<ConnectionManager>,
    mut state_rx: watch::Receiver<ConnectionState>,
    shutdown: CancellationToken,
) {
    loop {
        let state = *state_rx.borrow_and_update();
        match manager.upgrade() {
            Some(manager) if state.is_connected() => {
                manager.stream.start();
            }
            Some(manager) => {
                manager.stream.stop();
            }
            None => break,
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("State reactor exited");
}
