//! Image decoder trait

use crate::error::DecodeError;
use crate::image::ImageSurface;

/// Turns encoded image bytes into a displayable surface
///
/// This is the seam for the platform codec. Decoding runs on the task that
/// fetched the frame, so implementations should not block for long.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<ImageSurface, DecodeError>;
}
