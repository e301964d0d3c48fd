//! The [`FrameSource`] abstraction and the single-image source.
//!
//! A frame source is a lazy, non-restartable sequence of *sampled* frames:
//! whatever throttling the source needs has already happened by the time
//! [`FrameSource::next_frame`] returns.  `Ok(None)` ends the sequence.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ConfigError;

use super::Frame;

// ---------------------------------------------------------------------------
// FrameError
// ---------------------------------------------------------------------------

/// Transient capture failures.  The affected frame is dropped; the sequence
/// continues.
#[derive(Debug, Clone, Error)]
pub enum FrameError {
    #[error("camera read failed: {0}")]
    Read(String),

    #[error("frame encoding failed: {0}")]
    Encode(String),
}

// ---------------------------------------------------------------------------
// FrameSource trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next sampled frame.
    ///
    /// `Err(_)` is transient: callers log it and ask again.  `Ok(None)`
    /// means the source is exhausted and will never yield again.
    async fn next_frame(&mut self) -> Result<Option<Frame>, FrameError>;
}

// ---------------------------------------------------------------------------
// ImageSource
// ---------------------------------------------------------------------------

/// Yields one frame read from disk, then ends.
#[derive(Debug)]
pub struct ImageSource {
    frame: Option<Frame>,
}

impl ImageSource {
    /// Read and fully decode `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ImageRead`] when the file cannot be read and
    /// [`ConfigError::ImageDecode`] when it is not a decodable image.  Both
    /// are fatal at startup.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ConfigError::ImageRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let frame = Frame::decode(bytes).map_err(|e| ConfigError::ImageDecode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(Self::from_frame(frame))
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self { frame: Some(frame) }
    }

    /// The frame still waiting to be yielded, if any.
    pub fn peek(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }
}

#[async_trait]
impl FrameSource for ImageSource {
    async fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        Ok(self.frame.take())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
