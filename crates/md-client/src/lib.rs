//! md-client: MirrorDesk connection manager
//!
//! This crate pairs with a PC agent, keeps the session state machine,
//! streams screen frames and forwards remote input. Front ends construct a
//! single [`ConnectionManager`] and observe it through `watch` receivers.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use md_client::ConnectionManager;
//! use md_core::config::ClientConfig;
//!
//! # async fn run() -> Result<(), md_core::MdError> {
//! let manager = Arc::new(ConnectionManager::new(ClientConfig::default())?);
//! manager.connect("192.168.1.20", "123456").await?;
//!
//! let mut frames = manager.frames();
//! manager.start_stream();
//! frames.changed().await.ok();
//! println!("{:?}", frames.borrow().decoded.as_ref().map(|s| s.dimensions()));
//!
//! manager.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod decode;
pub mod geometry;
pub mod manager;
pub mod metrics;
pub mod pairing;
pub mod session;
pub mod stream;
pub mod transport;

pub use commands::{CommandDispatcher, NOT_CONNECTED};
pub use decode::HeaderDecoder;
pub use manager::ConnectionManager;
pub use metrics::{Metrics, MetricsMonitor};
pub use pairing::PairingNegotiator;
pub use session::{ActiveSession, Session};
pub use stream::{FetchOutcome, Frame, ScreenFetcher, ScreenStream, StreamStatsSnapshot};
pub use transport::HttpTransport;
