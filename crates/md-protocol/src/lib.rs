//! md-protocol: Wire types for the MirrorDesk agent API
//!
//! This crate defines the request and response bodies exchanged with the
//! PC agent over HTTP, the typed remote-input commands, and the data-URL
//! format in which the agent ships screen frames.

pub mod command;
pub mod error;
pub mod frame;
pub mod message;

pub use command::{MouseButton, NormalizedPoint, RemoteCommand};
pub use error::{FrameError, ProtocolError};
pub use frame::{DataUrl, DATA_URL_IMAGE_PREFIX};
pub use message::{
    CommandRequest, CommandResponse, ConnectionRequest, ConnectionResponse,
    ConnectionStatusResponse, ProbeResponse, SystemMetricsResponse, CONNECTION_CODE_HEADER,
};
