//! Camera loop orchestration and the status it publishes.
//!
//! # Architecture
//!
//! ```text
//! FrameSource (CameraFrames | ImageSource)
//!        │  latest sampled frame
//!        ▼
//! CameraLoop::run(cancel)  ← async tokio task
//!        │
//!        ├─ SharedCaptioner::caption   (single-flight)
//!        ├─ DetectionResult::from_caption
//!        ├─ AnnouncementController::observe ──▶ SpeechSink::say
//!        └─ SharedStatus ←──────── read by the preview window
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use shop_detector::announce::AnnouncementController;
//! use shop_detector::caption::{ApiCaptioner, SharedCaptioner};
//! use shop_detector::classify::KeywordSet;
//! use shop_detector::config::{CaptionConfig, SpeechConfig};
//! use shop_detector::frames::ImageSource;
//! use shop_detector::pipeline::{new_shared_status, CameraLoop};
//! use shop_detector::speech::CommandSpeaker;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let captioner = SharedCaptioner::new(Arc::new(ApiCaptioner::from_config(
//!     &CaptionConfig::default(),
//! )));
//! let speaker = Arc::new(CommandSpeaker::start(&SpeechConfig::default())?);
//! let announcer = AnnouncementController::new(Duration::from_secs(10), "This is a shop", speaker);
//!
//! let camera_loop = CameraLoop::new(
//!     Box::new(ImageSource::open("storefront.jpg")?),
//!     captioner,
//!     KeywordSet::default(),
//!     announcer,
//!     new_shared_status(),
//! );
//! let (summary, last) = camera_loop.run(CancellationToken::new()).await;
//! # Ok(())
//! # }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{CameraLoop, LoopSummary};
pub use state::{new_shared_status, DetectorStatus, SharedStatus, CAPTION_DISPLAY_CHARS};
