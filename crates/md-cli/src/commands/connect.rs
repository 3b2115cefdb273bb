//! Target resolution, probing and pairing

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::output::{print_error, print_info, print_success};
use md_client::{ConnectionManager, HttpTransport};
use md_core::config::ClientConfig;
use md_core::{AgentTransport, Endpoint, MdError, PairingCode, PairingTarget};

/// Work out what to pair with
///
/// With `--code` the target is a host or URL. Without it the target is read
/// as QR text carrying both. With no target at all the configured
/// `default_host` is used and `--code` is required.
pub fn resolve_target(
    config: &ClientConfig,
    target: Option<&str>,
    code: Option<&str>,
) -> Result<PairingTarget> {
    match (target, code) {
        (Some(host), Some(code)) => Ok(PairingTarget {
            host: host.trim().to_string(),
            code: PairingCode::new(code)?,
        }),
        (Some(text), None) => {
            PairingTarget::parse(text).context("Pass --code or a QR payload such as 'ip:code'")
        }
        (None, Some(code)) => {
            let host = config
                .default_host
                .clone()
                .context("No target given and no default_host configured")?;
            Ok(PairingTarget {
                host,
                code: PairingCode::new(code)?,
            })
        }
        (None, None) => bail!("No target given (a host with --code, or QR text)"),
    }
}

/// Build a manager and pair with `target`
///
/// On a pairing failure the user-facing advice is printed before the error
/// is returned.
pub async fn connect(config: &ClientConfig, target: &PairingTarget) -> Result<Arc<ConnectionManager>> {
    let manager =
        Arc::new(ConnectionManager::new(config.clone()).context("Failed to create client")?);

    print_info(&format!(
        "Pairing with {} as '{}', approve the request on the PC...",
        target.host, config.device_label
    ));

    match manager.connect_target(target).await {
        Ok(()) => {
            if let Some(endpoint) = manager.endpoint() {
                print_success(&format!("Connected to {}", endpoint));
            }
            Ok(manager)
        }
        Err(MdError::Pairing(e)) => {
            print_error(&e.advice());
            Err(e).context("Pairing failed")
        }
        Err(e) => Err(e).context("Pairing failed"),
    }
}

/// Check that an agent answers at `host`
pub async fn probe_command(config: &ClientConfig, host: &str) -> Result<()> {
    let endpoint = Endpoint::parse_with_port(host, config.default_port)?;
    let transport = HttpTransport::new(config).context("Failed to create HTTP client")?;

    match transport.probe(&endpoint).await {
        Ok(probe) => {
            print_success(&format!("Agent at {} is {}", endpoint, probe.status));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Agent at {} did not answer: {}", endpoint, e));
            Err(e).context("Probe failed")
        }
    }
}

/// Pair, report and disconnect
pub async fn pair_command(config: &ClientConfig, target: &PairingTarget) -> Result<()> {
    let manager = connect(config, target).await?;
    if let Some(code) = manager.pairing_code() {
        print_info(&format!("Paired with code {}", code));
    }
    manager.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_with_code() {
        let config = ClientConfig::default();
        let target = resolve_target(&config, Some(" 10.0.0.5 "), Some("123456")).unwrap();
        assert_eq!(target.host, "10.0.0.5");
        assert_eq!(target.code.as_str(), "123456");
    }

    #[test]
    fn test_qr_text_without_code() {
        let config = ClientConfig::default();
        let target = resolve_target(&config, Some("10.0.0.5:9000:654321"), None).unwrap();
        assert_eq!(target.host, "10.0.0.5:9000");
        assert_eq!(target.code.as_str(), "654321");
    }

    #[test]
    fn test_default_host() {
        let mut config = ClientConfig::default();
        assert!(resolve_target(&config, None, Some("123456")).is_err());

        config.default_host = Some("192.168.1.100".to_string());
        let target = resolve_target(&config, None, Some("123456")).unwrap();
        assert_eq!(target.host, "192.168.1.100");
    }

    #[test]
    fn test_bad_code_and_nothing_given() {
        let config = ClientConfig::default();
        assert!(resolve_target(&config, Some("10.0.0.5"), Some("12345")).is_err());
        assert!(resolve_target(&config, None, None).is_err());
    }
}
