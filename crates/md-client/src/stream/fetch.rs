//! Single screen fetch

use std::sync::Arc;

use tokio::sync::watch;

use md_core::time::current_time_millis;
use md_core::{AgentTransport, DecodeError, ImageDecoder, ImageSurface};
use md_protocol::{DataUrl, FrameError};

use super::Frame;
use crate::session::Session;

/// What a fetch did to the published frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not connected; nothing was requested
    Skipped,
    /// A new image was published
    Decoded,
    /// The body was empty or not a data URL; `raw` set, `decoded` cleared
    Invalid,
    /// The payload could not be decoded; `raw` set, `decoded` cleared
    DecodeFailed,
    /// The request failed; `decoded` cleared, `raw` kept
    TransportFailed,
    /// The session changed while the request was in flight; result dropped
    Stale,
}

impl FetchOutcome {
    pub fn is_success(self) -> bool {
        self == FetchOutcome::Decoded
    }
}

/// Fetches screen frames and publishes them on a `watch` channel
pub struct ScreenFetcher {
    session: Arc<Session>,
    transport: Arc<dyn AgentTransport>,
    decoder: Arc<dyn ImageDecoder>,
    frame_tx: watch::Sender<Frame>,
}

impl ScreenFetcher {
    pub fn new(
        session: Arc<Session>,
        transport: Arc<dyn AgentTransport>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        let (frame_tx, _) = watch::channel(Frame::default());
        Self {
            session,
            transport,
            decoder,
            frame_tx,
        }
    }

    /// Subscribe to frame updates
    pub fn subscribe(&self) -> watch::Receiver<Frame> {
        self.frame_tx.subscribe()
    }

    /// Copy of the latest frame
    pub fn latest(&self) -> Frame {
        self.frame_tx.borrow().clone()
    }

    /// Clear the published frame
    pub fn reset(&self) {
        self.frame_tx.send_if_modified(|frame| {
            if *frame == Frame::default() {
                return false;
            }
            *frame = Frame::default();
            true
        });
    }

    /// Fetch one frame if connected
    pub async fn fetch(&self) -> FetchOutcome {
        let Some(active) = self.session.active() else {
            return FetchOutcome::Skipped;
        };

        match self.transport.screen(&active.endpoint, &active.code).await {
            Ok(body) => {
                let (decoded, outcome) = self.decode_body(&body);
                let received_at = current_time_millis();
                let published = self.publish(active.generation, |frame| {
                    frame.raw = Some(body);
                    frame.decoded = decoded;
                    frame.received_at = Some(received_at);
                    true
                });
                if published {
                    outcome
                } else {
                    FetchOutcome::Stale
                }
            }
            Err(e) => {
                tracing::warn!("Screen fetch from {} failed: {}", active.endpoint, e);
                // Only a frame that still had an image is announced again
                let published =
                    self.publish(active.generation, |frame| frame.decoded.take().is_some());
                if published {
                    FetchOutcome::TransportFailed
                } else {
                    FetchOutcome::Stale
                }
            }
        }
    }

    fn decode_body(&self, body: &str) -> (Option<ImageSurface>, FetchOutcome) {
        let url = match DataUrl::parse(body) {
            Ok(url) => url,
            Err(e @ (FrameError::Empty | FrameError::MissingPrefix { .. })) => {
                tracing::warn!("Invalid screen payload: {}", e);
                return (None, FetchOutcome::Invalid);
            }
            Err(e) => {
                tracing::warn!("Undecodable screen payload: {}", e);
                return (None, FetchOutcome::DecodeFailed);
            }
        };

        let result = url
            .decode_payload()
            .map_err(DecodeError::from)
            .and_then(|bytes| self.decoder.decode(&bytes));
        match result {
            Ok(surface) => {
                tracing::debug!(
                    "Decoded {} frame {}x{} ({} bytes)",
                    surface.format,
                    surface.width,
                    surface.height,
                    surface.data.len()
                );
                (Some(surface), FetchOutcome::Decoded)
            }
            Err(e) => {
                tracing::warn!("Failed to decode {} frame: {}", url.media_type(), e);
                (None, FetchOutcome::DecodeFailed)
            }
        }
    }

    /// Apply `update` unless the session moved past `generation`
    ///
    /// `update` returns whether it changed the frame; subscribers are only
    /// notified when it did. The generation check runs under the channel's
    /// write lock, so a reset that follows a disconnect cannot be
    /// overwritten by a late fetch. Returns whether the update was applied.
    fn publish(&self, generation: u64, update: impl FnOnce(&mut Frame) -> bool) -> bool {
        let mut applied = false;
        self.frame_tx.send_if_modified(|frame| {
            if !self.session.is_current(generation) {
                return false;
            }
            applied = true;
            update(frame)
        });
        applied
    }
}
