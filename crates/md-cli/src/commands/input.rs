//! Remote input commands

use std::collections::HashMap;

use anyhow::{bail, Result};

use super::connect::connect;
use crate::output::{print_error, print_success};
use md_client::NOT_CONNECTED;
use md_core::config::ClientConfig;
use md_core::PairingTarget;
use md_protocol::RemoteCommand;

/// Split a `key=value` argument
pub fn parse_key_value(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => bail!("Expected key=value, got '{}'", arg),
    }
}

/// Pair and send an untyped command built from `key=value` pairs
pub async fn exec_command(
    config: &ClientConfig,
    target: &PairingTarget,
    kind: &str,
    pairs: &[String],
) -> Result<()> {
    let data = pairs
        .iter()
        .map(|pair| parse_key_value(pair))
        .collect::<Result<HashMap<_, _>>>()?;

    send_command(
        config,
        target,
        RemoteCommand::Custom {
            kind: kind.to_string(),
            data,
        },
    )
    .await
}

/// Pair, send one command and print the agent's answer
pub async fn send_command(
    config: &ClientConfig,
    target: &PairingTarget,
    command: RemoteCommand,
) -> Result<()> {
    let manager = connect(config, target).await?;
    let kind = command.kind().to_string();
    let message = manager.send(command).await;
    manager.shutdown();

    if message == NOT_CONNECTED || message.starts_with("Network error") {
        print_error(&message);
        bail!("'{}' was not delivered", kind);
    }
    print_success(&format!("{}: {}", kind, message));
    Ok(())
}
