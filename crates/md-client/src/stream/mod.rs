//! Screen streaming
//!
//! [`ScreenFetcher`] performs one `mobile/screen` round trip and publishes
//! the result as the latest [`Frame`]. [`ScreenStream`] repeats that on a
//! fixed delay in a background task that can be started and stopped.

mod fetch;
mod runner;

pub use fetch::{FetchOutcome, ScreenFetcher};
pub use runner::{ScreenStream, StreamStats, StreamStatsSnapshot};

use md_core::ImageSurface;

/// Latest screen frame
///
/// Only the newest value is kept. `raw` is the last body received, even if
/// it failed validation; `decoded` is the surface decoded from it, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub raw: Option<String>,
    pub decoded: Option<ImageSurface>,
    /// Unix millis at which `raw` was received
    pub received_at: Option<u64>,
}

impl Frame {
    pub fn has_image(&self) -> bool {
        self.decoded.is_some()
    }
}
