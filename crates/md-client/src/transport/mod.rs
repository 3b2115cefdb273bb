//! Transport to the PC agent

mod http;

pub use http::HttpTransport;
