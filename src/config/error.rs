//! Startup configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong before the detector starts running.
///
/// All variants are fatal: the binaries report them and exit non-zero.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("camera index must be a non-negative integer, got {0}")]
    InvalidCamera(i64),

    #[error("could not open camera {index}: {reason}")]
    CameraOpen { index: i32, reason: String },

    #[error("camera support is not compiled in; rebuild with `--features camera` or use --image")]
    CameraUnsupported,

    #[error("failed to start camera capture thread: {0}")]
    CaptureThread(String),

    #[error("cannot read image {}: {reason}", path.display())]
    ImageRead { path: PathBuf, reason: String },

    #[error("{} is not a supported image: {reason}", path.display())]
    ImageDecode { path: PathBuf, reason: String },

    #[error("interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),

    #[error("cooldown must be zero or a positive number of seconds, got {0}")]
    InvalidCooldown(f64),

    #[error("invalid bind address {addr:?}: {reason}")]
    InvalidBind { addr: String, reason: String },

    #[error("invalid allowed origin {0:?}")]
    InvalidOrigin(String),

    #[error("settings file {}: {reason}", path.display())]
    Settings { path: PathBuf, reason: String },
}
