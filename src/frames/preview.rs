//! Live preview window driven from the main thread.
//!
//! GUI toolkits such as Cocoa only accept window calls from the process's
//! main thread, so the capture thread never touches the window.  It hands
//! raw frames to a one-slot channel instead, and [`run_preview`] drains that
//! channel on whichever thread calls it (the main thread, in the binary).
//!
//! ```text
//! capture thread ── try_send ─▶ [1-slot channel] ─▶ run_preview ─▶ PreviewDisplay::show
//!                  (full: drop)                     (main thread)       │
//!                                                                  'q' ─┴─▶ cancel
//! ```

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::pipeline::{DetectorStatus, SharedStatus};

/// How often an idle preview loop re-checks cancellation.
const PREVIEW_POLL: Duration = Duration::from_millis(50);

/// What the preview window asked for after presenting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewEvent {
    Continue,
    Quit,
}

/// A window that shows one frame at a time with the HUD overlaid.
///
/// Created and used on a single thread, so there is no `Send` bound.
pub trait PreviewDisplay {
    type Frame: Send + 'static;

    fn show(&mut self, frame: Self::Frame, status: &DetectorStatus) -> PreviewEvent;
}

/// Sender/receiver pair between the capture thread and the preview loop.
///
/// One slot: while the window is busy, newer frames are dropped.
pub fn preview_channel<P>() -> (SyncSender<P>, Receiver<P>) {
    mpsc::sync_channel(1)
}

/// Show frames until `cancel` fires, the capture side hangs up, or the
/// display asks to quit (which cancels `cancel`).
///
/// Returns the number of frames shown.
pub fn run_preview<V: PreviewDisplay>(
    mut display: V,
    frames: Receiver<V::Frame>,
    status: &SharedStatus,
    cancel: &CancellationToken,
) -> u64 {
    let mut shown = 0;

    while !cancel.is_cancelled() {
        let frame = match frames.recv_timeout(PREVIEW_POLL) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let snapshot = match status.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        shown += 1;
        if display.show(frame, &snapshot) == PreviewEvent::Quit {
            log::info!("preview: quit requested");
            cancel.cancel();
            break;
        }
    }

    log::debug!("preview: closed after {shown} frames");
    shown
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
