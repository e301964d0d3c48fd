//! Detector status shared between the camera loop and the preview window.
//!
//! [`DetectorStatus`] is the single source of truth for what the HUD draws:
//! the latest caption, the status label and the outcome that produced it.
//! The camera loop writes it once per cycle; the capture thread snapshots it
//! for every preview frame.
//!
//! [`SharedStatus`] is a type alias for `Arc<Mutex<DetectorStatus>>`, cheap
//! to clone and safe to share across threads.

use std::sync::{Arc, Mutex};

use crate::announce::Announcement;
use crate::classify::DetectionResult;

/// Longest caption shown in the HUD before it is cut off.
pub const CAPTION_DISPLAY_CHARS: usize = 80;

// ---------------------------------------------------------------------------
// DetectorStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorStatus {
    /// HUD status text ("READY", "DETECTED SHOP", …).
    pub label: String,

    /// Most recent caption.  `None` until the first successful cycle.
    pub caption: Option<String>,

    /// Outcome of the most recent successful cycle.
    pub last: Option<Announcement>,

    /// Successfully captioned frames so far.
    pub cycles: u64,
}

impl DetectorStatus {
    pub fn new() -> Self {
        Self {
            label: Announcement::NotShop.label(),
            caption: None,
            last: None,
            cycles: 0,
        }
    }

    /// Record one completed detection cycle.
    pub fn record(&mut self, result: &DetectionResult, announcement: Announcement) {
        self.label = announcement.label();
        self.caption = Some(result.caption.clone());
        self.last = Some(announcement);
        self.cycles += 1;
    }

    /// `"Caption: …"`, truncated to [`CAPTION_DISPLAY_CHARS`] characters.
    ///
    /// ```
    /// use shop_detector::pipeline::DetectorStatus;
    ///
    /// let status = DetectorStatus::new();
    /// assert_eq!(status.caption_line(), "Caption: ...");
    /// ```
    pub fn caption_line(&self) -> String {
        match &self.caption {
            Some(caption) => {
                let shown: String = caption.chars().take(CAPTION_DISPLAY_CHARS).collect();
                format!("Caption: {shown}")
            }
            None => "Caption: ...".to_string(),
        }
    }

    /// Green in the HUD: either announcing right now or idle.  Suppressed
    /// detections are drawn in a warning colour.
    pub fn is_positive_or_ready(&self) -> bool {
        !matches!(self.last, Some(Announcement::Suppressed { .. }))
    }
}

impl Default for DetectorStatus {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SharedStatus
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`DetectorStatus`].
///
/// Lock for a short critical section only; never hold it across `.await`.
pub type SharedStatus = Arc<Mutex<DetectorStatus>>;

pub fn new_shared_status() -> SharedStatus {
    Arc::new(Mutex::new(DetectorStatus::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
