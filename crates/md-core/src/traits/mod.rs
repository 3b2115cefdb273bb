//! Core trait definitions

mod decoder;
mod transport;

pub use decoder::ImageDecoder;
pub use transport::AgentTransport;
