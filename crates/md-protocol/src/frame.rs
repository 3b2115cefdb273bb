//! Screen frames as shipped by the agent
//!
//! `GET mobile/screen` answers with a bare data URL such as
//! `data:image/jpeg;base64,/9j/4AAQ...`. The body is plain text, never
//! JSON-wrapped. Parsing is split in two steps so callers can keep the raw
//! text for diagnostics even when the payload turns out to be undecodable:
//!
//! 1. [`DataUrl::parse`] checks the shape and locates the payload
//! 2. [`DataUrl::decode_payload`] base64-decodes it

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::FrameError;

/// Prefix every valid screen frame starts with
pub const DATA_URL_IMAGE_PREFIX: &str = "data:image";

const BASE64_MARKER: &str = "base64,";

/// Number of characters of an invalid body echoed back in errors
const PREVIEW_LEN: usize = 50;

/// Standard alphabet, padding optional. Agents built on different base64
/// libraries disagree on trailing `=`.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A parsed `data:image/...;base64,...` URL borrowing from the response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUrl<'a> {
    media_type: &'a str,
    payload: &'a str,
}

impl<'a> DataUrl<'a> {
    /// Validate the frame shape and locate the base64 payload.
    pub fn parse(text: &'a str) -> Result<Self, FrameError> {
        if text.is_empty() {
            return Err(FrameError::Empty);
        }
        if !text.starts_with(DATA_URL_IMAGE_PREFIX) {
            return Err(FrameError::MissingPrefix {
                preview: text.chars().take(PREVIEW_LEN).collect(),
            });
        }

        let (header, payload) = text
            .split_once(BASE64_MARKER)
            .ok_or(FrameError::MissingPayload)?;
        if payload.trim().is_empty() {
            return Err(FrameError::MissingPayload);
        }

        // "data:image/png;" -> "image/png"
        let media_type = header["data:".len()..]
            .split([';', ','])
            .next()
            .unwrap_or_default();

        Ok(Self {
            media_type,
            payload,
        })
    }

    /// MIME type declared by the URL, e.g. `image/png`
    pub fn media_type(&self) -> &'a str {
        self.media_type
    }

    /// The undecoded base64 text after the `base64,` marker
    pub fn payload(&self) -> &'a str {
        self.payload
    }

    /// Decode the payload into image bytes.
    ///
    /// Line breaks and other whitespace inside the payload are ignored.
    pub fn decode_payload(&self) -> Result<Vec<u8>, FrameError> {
        let decoded = if self.payload.bytes().any(|b| b.is_ascii_whitespace()) {
            let compact: String = self
                .payload
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            LENIENT_STANDARD.decode(compact)
        } else {
            LENIENT_STANDARD.decode(self.payload)
        };

        decoded.map_err(|e| FrameError::Base64(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_parse_png_data_url() {
        let text = format!("data:image/png;base64,{}", PIXEL_PNG);
        let url = DataUrl::parse(&text).unwrap();
        assert_eq!(url.media_type(), "image/png");
        assert_eq!(url.payload(), PIXEL_PNG);

        let bytes = url.decode_payload().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(DataUrl::parse(""), Err(FrameError::Empty));
    }

    #[test]
    fn test_parse_rejects_missing_prefix() {
        let err = DataUrl::parse("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, FrameError::MissingPrefix { .. }));
    }

    #[test]
    fn test_parse_rejects_missing_payload() {
        assert_eq!(
            DataUrl::parse("data:image/png;base64,"),
            Err(FrameError::MissingPayload)
        );
        assert_eq!(
            DataUrl::parse("data:image/png,rawbytes"),
            Err(FrameError::MissingPayload)
        );
    }

    #[test]
    fn test_decode_tolerates_whitespace_and_missing_padding() {
        let unpadded = PIXEL_PNG.trim_end_matches('=');
        let wrapped = format!(
            "data:image/png;base64,{}\n{}",
            &unpadded[..20],
            &unpadded[20..]
        );
        let bytes = DataUrl::parse(&wrapped).unwrap().decode_payload().unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_decode_invalid_base64() {
        let url = DataUrl::parse("data:image/jpeg;base64,@@not-base64@@").unwrap();
        assert!(matches!(url.decode_payload(), Err(FrameError::Base64(_))));
    }
}
