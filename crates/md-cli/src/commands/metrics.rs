//! Metrics command implementation

use anyhow::Result;

use super::connect::connect;
use crate::output::{format_metrics, print_warning};
use md_client::Metrics;
use md_core::config::ClientConfig;
use md_core::PairingTarget;

/// Pair and print the PC's CPU, RAM and network usage
pub async fn metrics_command(config: &ClientConfig, target: &PairingTarget) -> Result<()> {
    let manager = connect(config, target).await?;
    manager.fetch_metrics().await;
    let metrics = manager.latest_metrics();
    manager.shutdown();

    if metrics == Metrics::default() {
        print_warning("The agent did not report metrics");
    }
    println!("{}", format_metrics(&metrics));
    Ok(())
}
