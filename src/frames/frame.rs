//! The [`Frame`] type and image payload validation.
//!
//! A frame carries an *encoded* image (JPEG, PNG, …) so it can be handed to
//! the caption engine without re-encoding.  Anything that enters the
//! pipeline from outside (an `--image` file, an HTTP upload) goes through
//! [`Frame::decode`], which sniffs the format from magic bytes and performs a
//! full decode before the frame is accepted.

use std::time::Instant;

use bytes::Bytes;
use image::ImageFormat;
use thiserror::Error;

/// Uploads and image files above this size are rejected (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// ---------------------------------------------------------------------------
// ImageError
// ---------------------------------------------------------------------------

/// Reasons an image payload was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("image data is empty")]
    Empty,

    #[error("image is too large: {0} bytes (max {MAX_IMAGE_BYTES} bytes)")]
    TooLarge(usize),

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("failed to decode image: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One encoded image plus the monotonic instant it was captured.
///
/// Cheap to clone: the payload is reference-counted.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Bytes,
    pub format: ImageFormat,
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap an already-encoded payload whose format is known (camera path).
    pub fn encoded(data: impl Into<Bytes>, format: ImageFormat, captured_at: Instant) -> Self {
        Self {
            data: data.into(),
            format,
            captured_at,
        }
    }

    /// Validate untrusted bytes and wrap them as a frame captured now.
    ///
    /// # Errors
    ///
    /// Any [`ImageError`]; the payload is never partially accepted.
    pub fn decode(data: impl Into<Bytes>) -> Result<Self, ImageError> {
        let data = data.into();

        if data.is_empty() {
            return Err(ImageError::Empty);
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge(data.len()));
        }

        let format = detect_format(&data)?;
        image::load_from_memory_with_format(&data, format)
            .map_err(|e| ImageError::Decode(e.to_string()))?;

        Ok(Self {
            data,
            format,
            captured_at: Instant::now(),
        })
    }

    /// MIME subtype used when building `data:image/<subtype>;base64,` URLs.
    pub fn mime_subtype(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            _ => "jpeg",
        }
    }
}

/// Detect the container format from leading magic bytes.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Ok(ImageFormat::Png),
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Ok(ImageFormat::WebP),
        [b'G', b'I', b'F', b'8', v, b'a', ..] if *v == b'7' || *v == b'9' => Ok(ImageFormat::Gif),
        [b'B', b'M', ..] => Ok(ImageFormat::Bmp),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),
        _ => Err(ImageError::UnsupportedFormat),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
