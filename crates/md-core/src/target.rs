//! Pairing targets read from QR codes
//!
//! The PC app shows a QR code encoding where to connect and with which
//! code. Three layouts are in circulation:
//!
//! - `ip:code`
//! - `ip:port:code`
//! - anything else containing an IPv4 address and a 6-digit run,
//!   e.g. `SmartDesk 192.168.1.20 code 123456`

use std::sync::OnceLock;

use regex::Regex;

use crate::error::InputError;
use crate::types::PairingCode;

/// Where and how to pair, as decoded from a QR payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingTarget {
    /// `ip` or `ip:port`, ready for [`crate::Endpoint::parse`]
    pub host: String,
    pub code: PairingCode,
}

impl PairingTarget {
    /// Parse a scanned QR payload
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let text = text.trim();
        let unrecognized = || InputError::UnrecognizedTarget(text.to_string());

        let parts: Vec<&str> = text.split(':').collect();
        match parts.as_slice() {
            [ip, code] if !ip.is_empty() => Ok(Self {
                host: ip.to_string(),
                code: PairingCode::new(code)?,
            }),
            [ip, port, code] if !ip.is_empty() && port.parse::<u16>().is_ok() => Ok(Self {
                host: format!("{}:{}", ip, port),
                code: PairingCode::new(code)?,
            }),
            _ => {
                let ip = ipv4_pattern().find(text).ok_or_else(unrecognized)?;
                // Search for the code after removing the address so its
                // octets can never be mistaken for part of a code.
                let rest = format!("{} {}", &text[..ip.start()], &text[ip.end()..]);
                let code = code_pattern().find(&rest).ok_or_else(unrecognized)?;
                Ok(Self {
                    host: ip.as_str().to_string(),
                    code: PairingCode::new(code.as_str())?,
                })
            }
        }
    }
}

fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("valid IPv4 regex")
    })
}

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\d{6}\b").expect("valid code regex"))
}
