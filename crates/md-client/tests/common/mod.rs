//! Shared test fixtures: a scripted in-process agent

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use md_client::{ConnectionManager, HeaderDecoder};
use md_core::config::ClientConfig;
use md_core::{AgentTransport, Endpoint, PairingCode, TransportError};
use md_protocol::{
    CommandRequest, CommandResponse, ConnectionRequest, ConnectionResponse,
    ConnectionStatusResponse, ProbeResponse, SystemMetricsResponse,
};

/// 1x1 PNG
pub const PIXEL_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub const CODE: &str = "123456";
pub const HOST: &str = "192.168.1.20";

pub fn png_frame() -> String {
    format!("data:image/png;base64,{}", PIXEL_PNG_BASE64)
}

pub fn status(active: bool, message: &str) -> ConnectionStatusResponse {
    ConnectionStatusResponse {
        active,
        message: message.to_string(),
    }
}

/// Agent whose answers are set by the test, counting every call
pub struct MockAgent {
    probe: Mutex<Result<ProbeResponse, TransportError>>,
    request: Mutex<Result<ConnectionResponse, TransportError>>,
    /// Consumed one per poll; `idle_status` once empty
    statuses: Mutex<VecDeque<Result<ConnectionStatusResponse, TransportError>>>,
    idle_status: Mutex<ConnectionStatusResponse>,
    screen: Mutex<Result<String, TransportError>>,
    screen_delay: Mutex<Duration>,
    command: Mutex<Result<CommandResponse, TransportError>>,
    metrics: Mutex<Result<SystemMetricsResponse, TransportError>>,
    metrics_delay: Mutex<Duration>,

    pub probe_calls: AtomicUsize,
    pub request_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub screen_calls: AtomicUsize,
    pub command_calls: AtomicUsize,
    pub metrics_calls: AtomicUsize,
    pub poll_times: Mutex<Vec<Instant>>,
    pub last_request: Mutex<Option<ConnectionRequest>>,
    pub last_command: Mutex<Option<CommandRequest>>,
}

impl MockAgent {
    /// Agent that approves on the first poll and serves a 1x1 PNG
    pub fn new() -> Self {
        Self {
            probe: Mutex::new(Ok(ProbeResponse {
                status: "running".to_string(),
            })),
            request: Mutex::new(Ok(ConnectionResponse {
                success: true,
                request_id: Some(1),
                message: Some("Request sent".to_string()),
            })),
            statuses: Mutex::new(VecDeque::new()),
            idle_status: Mutex::new(status(true, "Connected")),
            screen: Mutex::new(Ok(png_frame())),
            screen_delay: Mutex::new(Duration::ZERO),
            command: Mutex::new(Ok(CommandResponse {
                success: true,
                message: Some("ok".to_string()),
                error: None,
                system_info: None,
            })),
            metrics: Mutex::new(Ok(SystemMetricsResponse {
                cpu: "12%".to_string(),
                ram: "48%".to_string(),
                net: "1.2 MB/s".to_string(),
            })),
            metrics_delay: Mutex::new(Duration::ZERO),
            probe_calls: AtomicUsize::new(0),
            request_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            screen_calls: AtomicUsize::new(0),
            command_calls: AtomicUsize::new(0),
            metrics_calls: AtomicUsize::new(0),
            poll_times: Mutex::new(Vec::new()),
            last_request: Mutex::new(None),
            last_command: Mutex::new(None),
        }
    }

    pub fn set_probe(&self, result: Result<ProbeResponse, TransportError>) {
        *self.probe.lock() = result;
    }

    pub fn set_request(&self, result: Result<ConnectionResponse, TransportError>) {
        *self.request.lock() = result;
    }

    pub fn push_status(&self, result: Result<ConnectionStatusResponse, TransportError>) {
        self.statuses.lock().push_back(result);
    }

    pub fn set_idle_status(&self, status: ConnectionStatusResponse) {
        *self.idle_status.lock() = status;
    }

    pub fn set_screen(&self, result: Result<String, TransportError>) {
        *self.screen.lock() = result;
    }

    pub fn set_screen_delay(&self, delay: Duration) {
        *self.screen_delay.lock() = delay;
    }

    pub fn set_command(&self, result: Result<CommandResponse, TransportError>) {
        *self.command.lock() = result;
    }

    pub fn set_metrics(&self, result: Result<SystemMetricsResponse, TransportError>) {
        *self.metrics.lock() = result;
    }

    pub fn set_metrics_delay(&self, delay: Duration) {
        *self.metrics_delay.lock() = delay;
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentTransport for MockAgent {
    async fn probe(&self, _endpoint: &Endpoint) -> Result<ProbeResponse, TransportError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.probe.lock().clone()
    }

    async fn request_connection(
        &self,
        _endpoint: &Endpoint,
        request: &ConnectionRequest,
    ) -> Result<ConnectionResponse, TransportError> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());
        self.request.lock().clone()
    }

    async fn connection_status(
        &self,
        _endpoint: &Endpoint,
        _code: &PairingCode,
    ) -> Result<ConnectionStatusResponse, TransportError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.poll_times.lock().push(Instant::now());
        let next = self.statuses.lock().pop_front();
        next.unwrap_or_else(|| Ok(self.idle_status.lock().clone()))
    }

    async fn screen(
        &self,
        _endpoint: &Endpoint,
        _code: &PairingCode,
    ) -> Result<String, TransportError> {
        self.screen_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.screen_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.screen.lock().clone()
    }

    async fn execute_command(
        &self,
        _endpoint: &Endpoint,
        _code: &PairingCode,
        request: &CommandRequest,
    ) -> Result<CommandResponse, TransportError> {
        self.command_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_command.lock() = Some(request.clone());
        self.command.lock().clone()
    }

    async fn system_metrics(
        &self,
        _endpoint: &Endpoint,
        _code: &PairingCode,
    ) -> Result<SystemMetricsResponse, TransportError> {
        self.metrics_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.metrics_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.metrics.lock().clone()
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        device_label: "test-phone".to_string(),
        ..ClientConfig::default()
    }
}

pub fn manager_with(agent: &Arc<MockAgent>) -> Arc<ConnectionManager> {
    Arc::new(ConnectionManager::with_parts(
        test_config(),
        Arc::clone(agent) as Arc<dyn AgentTransport>,
        Arc::new(HeaderDecoder::new()),
    ))
}

/// Manager already paired with `agent`
pub async fn connected_manager(agent: &Arc<MockAgent>) -> Arc<ConnectionManager> {
    let manager = manager_with(agent);
    manager
        .connect(HOST, CODE)
        .await
        .expect("pairing with mock agent failed");
    manager
}
