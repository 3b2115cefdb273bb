//! PC resource metrics

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use md_core::AgentTransport;
use md_protocol::SystemMetricsResponse;

use crate::session::Session;

/// Shown for a metric that is unknown
pub const UNKNOWN_METRIC: &str = "--";

/// CPU, RAM and network usage as formatted by the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metrics {
    pub cpu: String,
    pub ram: String,
    pub net: String,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            cpu: UNKNOWN_METRIC.to_string(),
            ram: UNKNOWN_METRIC.to_string(),
            net: UNKNOWN_METRIC.to_string(),
        }
    }
}

impl From<SystemMetricsResponse> for Metrics {
    fn from(response: SystemMetricsResponse) -> Self {
        Self {
            cpu: response.cpu,
            ram: response.ram,
            net: response.net,
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU {} | RAM {} | NET {}", self.cpu, self.ram, self.net)
    }
}

/// Fetches metrics and publishes them on a `watch` channel
pub struct MetricsMonitor {
    session: Arc<Session>,
    transport: Arc<dyn AgentTransport>,
    metrics_tx: watch::Sender<Metrics>,
}

impl MetricsMonitor {
    pub fn new(session: Arc<Session>, transport: Arc<dyn AgentTransport>) -> Self {
        let (metrics_tx, _) = watch::channel(Metrics::default());
        Self {
            session,
            transport,
            metrics_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Metrics> {
        self.metrics_tx.subscribe()
    }

    pub fn latest(&self) -> Metrics {
        self.metrics_tx.borrow().clone()
    }

    /// Fetch metrics if connected
    ///
    /// Returns `false` if not connected or the result was dropped because
    /// the session changed meanwhile. A failed request publishes the
    /// unknown defaults.
    pub async fn fetch(&self) -> bool {
        let Some(active) = self.session.active() else {
            return false;
        };

        let metrics = match self
            .transport
            .system_metrics(&active.endpoint, &active.code)
            .await
        {
            Ok(response) => Metrics::from(response),
            Err(e) => {
                tracing::warn!("Metrics fetch from {} failed: {}", active.endpoint, e);
                Metrics::default()
            }
        };

        let mut applied = false;
        self.metrics_tx.send_if_modified(|current| {
            if !self.session.is_current(active.generation) {
                return false;
            }
            applied = true;
            if *current == metrics {
                return false;
            }
            *current = metrics;
            true
        });
        applied
    }

    /// Back to the unknown defaults
    pub fn reset(&self) {
        self.metrics_tx.send_if_modified(|current| {
            if *current == Metrics::default() {
                return false;
            }
            *current = Metrics::default();
            true
        });
    }
}
