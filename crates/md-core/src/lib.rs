//! md-core: Core abstractions and configuration for MirrorDesk
//!
//! This crate provides the domain types, error taxonomy, configuration
//! structures and trait seams shared by the client library and the CLI.

pub mod config;
pub mod error;
pub mod image;
pub mod target;
pub mod time;
pub mod traits;
pub mod types;

pub use error::{
    ConfigError, DecodeError, InputError, MdError, PairingError, SessionError, TransportError,
};
pub use image::{ImageFormat, ImageSurface};
pub use target::PairingTarget;
pub use traits::{AgentTransport, ImageDecoder};
pub use types::{ConnectionState, Endpoint, PairingCode, DEFAULT_AGENT_PORT};
