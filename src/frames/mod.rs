//! Frame acquisition: where images enter the detection pipeline.
//!
//! # Sources
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    FrameSource (trait)                     │
//! │                                                            │
//! │   ImageSource                  CameraFrames                │
//! │   - one frame from disk        - capture thread            │
//! │   - then end of sequence       - SamplingClock throttle    │
//! │                                - latest-wins watch slot    │
//! │                                - raw frames to run_preview │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The physical webcam ([`OpenCvCamera`]) is only compiled with the `camera`
//! feature.  Sampling, the capture thread and image validation do not
//! depend on any backend.

pub mod capture;
pub mod frame;
pub mod preview;
#[cfg(feature = "camera")]
pub mod webcam;
pub mod sampling;
pub mod source;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use capture::{CameraFrames, CaptureDevice, CaptureOptions};
pub use frame::{detect_format, Frame, ImageError, MAX_IMAGE_BYTES};
pub use preview::{preview_channel, run_preview, PreviewDisplay, PreviewEvent};
#[cfg(feature = "camera")]
pub use webcam::{show_still, LiveWindow, OpenCvCamera};
pub use sampling::SamplingClock;
pub use source::{FrameError, FrameSource, ImageSource};
