//! Caption engine adapter.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                CaptionEngine (trait)                 │
//! │                                                      │
//! │   ┌──────────────────┐      ┌──────────────┐         │
//! │   │ SharedCaptioner  │      │ ApiCaptioner │         │
//! │   │ - single-flight  │─────▶│ - reqwest    │         │
//! │   │   gate (Mutex)   │      │ - base64 img │         │
//! │   └──────────────────┘      └──────┬───────┘         │
//! │                                    ▼                 │
//! │                     model server (chat completions)  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shop_detector::caption::{ApiCaptioner, SharedCaptioner};
//! use shop_detector::config::CaptionConfig;
//! use shop_detector::frames::ImageSource;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let captioner = SharedCaptioner::new(Arc::new(ApiCaptioner::from_config(
//!     &CaptionConfig::default(),
//! )));
//! let source = ImageSource::open("storefront.jpg")?;
//! let caption = captioner.caption(source.peek().unwrap()).await?;
//! println!("{caption}");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod engine;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use api::ApiCaptioner;
pub use engine::{CaptionEngine, CaptionError, SharedCaptioner};

// test-only re-export so the pipeline and server tests can reach the mock.
#[cfg(test)]
pub use engine::MockCaptionEngine;
