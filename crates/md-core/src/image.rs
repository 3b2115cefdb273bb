//! Decoded screen images

use std::fmt;

use bytes::Bytes;

/// Container formats the agent is known to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    WebP,
}

impl ImageFormat {
    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::WebP => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Gif => "GIF",
            ImageFormat::Bmp => "BMP",
            ImageFormat::WebP => "WebP",
        };
        f.write_str(name)
    }
}

/// A displayable image surface produced by an [`crate::ImageDecoder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSurface {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Encoded image bytes, cheap to clone between observers
    pub data: Bytes,
}

impl ImageSurface {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
