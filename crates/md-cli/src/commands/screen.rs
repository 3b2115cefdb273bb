//! Screen commands: live watch and single screenshots

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use super::connect::connect;
use crate::output::{format_frame, format_stream_stats, print_info, print_success, print_warning};
use md_client::{ConnectionManager, FetchOutcome};
use md_core::config::ClientConfig;
use md_core::PairingTarget;

/// How often `watch` refreshes the metrics line
const METRICS_REFRESH: Duration = Duration::from_secs(5);

/// Pair and print one line per received frame until Ctrl-C
///
/// The stream is started by the state reactor once the session is
/// connected, so a session that drops on the agent side ends the watch.
pub async fn watch_command(
    config: &ClientConfig,
    target: &PairingTarget,
    max_frames: Option<u64>,
) -> Result<()> {
    let manager = connect(config, target).await?;
    let reactor = manager.spawn_state_reactor();

    let refresher = tokio::spawn(refresh_metrics(Arc::clone(&manager)));

    let mut frames = manager.frames();
    let mut metrics = manager.metrics();
    let mut state = manager.subscribe_state();
    let mut received: u64 = 0;

    print_info(&format!(
        "Streaming every {}ms, press Ctrl-C to stop",
        config.stream.interval.as_millis()
    ));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                print_info("Interrupted");
                break;
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                if frame.raw.is_none() {
                    continue;
                }
                received += 1;
                println!("{}", format_frame(received, &frame));
                if max_frames.is_some_and(|max| received >= max) {
                    break;
                }
            }
            changed = state.changed() => {
                let connected = changed.is_ok() && state.borrow_and_update().is_connected();
                if !connected {
                    print_warning("Session ended");
                    break;
                }
            }
            changed = metrics.changed() => {
                if changed.is_ok() {
                    println!("{}", *metrics.borrow_and_update());
                }
            }
        }
    }

    refresher.abort();
    let stats = manager.stream_stats();
    manager.shutdown();
    reactor.await.ok();

    println!("{}", format_stream_stats(&stats));
    Ok(())
}

/// Fetch metrics in the background so a slow agent never holds up frames
async fn refresh_metrics(manager: Arc<ConnectionManager>) {
    loop {
        manager.fetch_metrics().await;
        tokio::time::sleep(METRICS_REFRESH).await;
    }
}

/// Pair, fetch one frame and write the decoded image to `out`
pub async fn screenshot_command(
    config: &ClientConfig,
    target: &PairingTarget,
    out: &Path,
) -> Result<()> {
    let manager = connect(config, target).await?;
    let outcome = manager.fetch_screen().await;
    let frame = manager.latest_frame();
    manager.shutdown();

    let surface = match (outcome, frame.decoded) {
        (FetchOutcome::Decoded, Some(surface)) => surface,
        (outcome, _) => bail!("No usable frame received ({:?})", outcome),
    };

    std::fs::write(out, &surface.data)
        .with_context(|| format!("Failed to write screenshot: {:?}", out))?;

    let hinted = out
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(surface.format.extension()));
    if hinted == Some(false) {
        print_warning(&format!(
            "Image is {}, consider a .{} extension",
            surface.format,
            surface.format.extension()
        ));
    }

    print_success(&format!(
        "Saved {}x{} {} to {:?}",
        surface.width, surface.height, surface.format, out
    ));
    Ok(())
}
