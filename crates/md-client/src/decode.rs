//! Container-level image decoder
//!
//! Identifies the container by its magic bytes, reads the pixel dimensions
//! from the header and checks that the body is complete (end marker or
//! declared size present). Compressed pixel data is not inflated, so damage
//! inside an otherwise complete image goes unnoticed. The encoded bytes are
//! handed on unchanged; rasterising them is the renderer's job.

use bytes::Bytes;

use md_core::{DecodeError, ImageDecoder, ImageFormat, ImageSurface};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";

/// [`ImageDecoder`] that validates PNG, JPEG, GIF, BMP and WebP containers
///
/// A truncated body fails with [`DecodeError::Corrupt`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecoder;

impl HeaderDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Detect the container format from the leading bytes
    pub fn sniff(bytes: &[u8]) -> Option<ImageFormat> {
        if bytes.starts_with(PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(GIF87_MAGIC) || bytes.starts_with(GIF89_MAGIC) {
            Some(ImageFormat::Gif)
        } else if bytes.starts_with(b"BM") {
            Some(ImageFormat::Bmp)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::WebP)
        } else {
            None
        }
    }
}

impl ImageDecoder for HeaderDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<ImageSurface, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let format = Self::sniff(bytes).ok_or(DecodeError::UnsupportedFormat)?;
        let (width, height) = match format {
            ImageFormat::Png => png_dimensions(bytes)?,
            ImageFormat::Jpeg => jpeg_dimensions(bytes)?,
            ImageFormat::Gif => gif_dimensions(bytes)?,
            ImageFormat::Bmp => bmp_dimensions(bytes)?,
            ImageFormat::WebP => webp_dimensions(bytes)?,
        };
        if width == 0 || height == 0 {
            return Err(corrupt(format, "zero-sized image"));
        }
        check_complete(format, bytes)?;

        Ok(ImageSurface {
            format,
            width,
            height,
            data: Bytes::copy_from_slice(bytes),
        })
    }
}

fn corrupt(format: ImageFormat, reason: &str) -> DecodeError {
    let format = match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::WebP => "WebP",
    };
    DecodeError::Corrupt {
        format,
        reason: reason.to_string(),
    }
}

/// Reject bodies cut short before the end marker or declared size
fn check_complete(format: ImageFormat, bytes: &[u8]) -> Result<(), DecodeError> {
    let complete = match format {
        // Last chunk is IEND: zero length, type, CRC
        ImageFormat::Png => {
            bytes.len() >= 12 && &bytes[bytes.len() - 8..bytes.len() - 4] == b"IEND"
        }
        // Encoders may pad after EOI
        ImageFormat::Jpeg => {
            let end = bytes.iter().rposition(|&b| b != 0x00).map_or(0, |i| i + 1);
            bytes[..end].ends_with(&[0xFF, 0xD9])
        }
        ImageFormat::Gif => bytes.last() == Some(&0x3B),
        // A zero file size is allowed by the format
        ImageFormat::Bmp => le_u32(bytes, 2).is_some_and(|size| size as usize <= bytes.len()),
        ImageFormat::WebP => {
            le_u32(bytes, 4).is_some_and(|size| size as usize + 8 <= bytes.len())
        }
    };
    if complete {
        Ok(())
    } else {
        Err(corrupt(format, "truncated image data"))
    }
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u16> {
    bytes.get(at..at + 2).map(|b| u16::from_be_bytes([b[0], b[1]]))
}

fn le_u16(bytes: &[u8], at: usize) -> Option<u16> {
    bytes.get(at..at + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn le_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn le_u24(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 3)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], 0]))
}

/// Signature, then the IHDR chunk: length, `IHDR`, width, height
fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    if bytes.get(12..16) != Some(b"IHDR".as_slice()) {
        return Err(corrupt(ImageFormat::Png, "missing IHDR chunk"));
    }
    match (be_u32(bytes, 16), be_u32(bytes, 20)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(corrupt(ImageFormat::Png, "truncated IHDR chunk")),
    }
}

/// Walk the marker segments up to the first start-of-frame
fn jpeg_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    let mut i = 2;
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return Err(corrupt(ImageFormat::Jpeg, "bad marker"));
        }
        let marker = bytes[i + 1];
        // Fill bytes
        if marker == 0xFF {
            i += 1;
            continue;
        }
        // Standalone markers carry no length
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            i += 2;
            continue;
        }
        if marker == 0xD9 || marker == 0xDA {
            break;
        }
        let len = be_u16(bytes, i + 2).map(usize::from).unwrap_or(0);
        if len < 2 {
            return Err(corrupt(ImageFormat::Jpeg, "bad segment length"));
        }
        let is_sof = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            return match (be_u16(bytes, i + 5), be_u16(bytes, i + 7)) {
                (Some(h), Some(w)) => Ok((u32::from(w), u32::from(h))),
                _ => Err(corrupt(ImageFormat::Jpeg, "truncated frame header")),
            };
        }
        i += 2 + len;
    }
    Err(corrupt(ImageFormat::Jpeg, "no frame header"))
}

/// Logical screen descriptor follows the 6-byte signature
fn gif_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    match (le_u16(bytes, 6), le_u16(bytes, 8)) {
        (Some(w), Some(h)) => Ok((u32::from(w), u32::from(h))),
        _ => Err(corrupt(ImageFormat::Gif, "truncated screen descriptor")),
    }
}

/// BITMAPINFOHEADER width and height; a negative height means top-down rows
fn bmp_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    match (le_u32(bytes, 18), le_u32(bytes, 22)) {
        (Some(w), Some(h)) => Ok(((w as i32).unsigned_abs(), (h as i32).unsigned_abs())),
        _ => Err(corrupt(ImageFormat::Bmp, "truncated info header")),
    }
}

fn webp_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    let truncated = || corrupt(ImageFormat::WebP, "truncated chunk");
    match bytes.get(12..16) {
        // Lossy: frame tag, start code, then 14-bit width and height
        Some(b"VP8 ") => {
            if bytes.get(23..26) != Some([0x9D, 0x01, 0x2A].as_slice()) {
                return Err(corrupt(ImageFormat::WebP, "missing VP8 start code"));
            }
            let w = le_u16(bytes, 26).ok_or_else(truncated)?;
            let h = le_u16(bytes, 28).ok_or_else(truncated)?;
            Ok((u32::from(w & 0x3FFF), u32::from(h & 0x3FFF)))
        }
        // Lossless: signature byte, then 14-bit width-1 and height-1
        Some(b"VP8L") => {
            if bytes.get(20) != Some(&0x2F) {
                return Err(corrupt(ImageFormat::WebP, "missing VP8L signature"));
            }
            let bits = le_u32(bytes, 21).ok_or_else(truncated)?;
            Ok(((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1))
        }
        // Extended: 24-bit canvas width-1 and height-1
        Some(b"VP8X") => {
            let w = le_u24(bytes, 24).ok_or_else(truncated)?;
            let h = le_u24(bytes, 27).ok_or_else(truncated)?;
            Ok((w + 1, h + 1))
        }
        _ => Err(corrupt(ImageFormat::WebP, "unknown chunk")),
    }
}
