//! QR payload inspection

use anyhow::{Context, Result};

use crate::output::print_success;
use md_core::config::ClientConfig;
use md_core::{Endpoint, PairingTarget};

/// Parse a scanned QR payload and show what it would pair with
pub fn qr_command(config: &ClientConfig, text: &str) -> Result<()> {
    let target = PairingTarget::parse(text).context("Not a pairing QR code")?;
    let endpoint = Endpoint::parse_with_port(&target.host, config.default_port)?;

    print_success("Recognised pairing code");
    println!("  Host:     {}", target.host);
    println!("  Code:     {}", target.code);
    println!("  Endpoint: {}", endpoint);
    Ok(())
}
