//! Continuous camera capture on a dedicated OS thread.
//!
//! The capture thread reads frames as fast as the device delivers them,
//! offers each one to a [`SamplingClock`], and publishes only the sampled
//! ones into a `tokio::sync::watch` slot.  The slot holds at most one frame:
//! if the pipeline is still busy captioning, a newer sample replaces the
//! pending one instead of queueing behind it.
//!
//! ```text
//! device.grab() ─▶ SamplingClock::try_sample ─▶ device.encode() ─▶ watch slot
//!       │                                                              │
//!       └─▶ device.preview_frame() ─▶ preview channel     CameraFrames::next_frame
//! ```
//!
//! The capture thread never opens a window; preview frames go to
//! [`run_preview`](super::run_preview) on the main thread.
//!
//! The device is owned by the thread and dropped when the thread exits, so
//! it is released on every exit path: cancellation, preview quit, or the
//! [`CameraFrames`] handle being dropped.

use std::sync::mpsc::{self as std_mpsc, SyncSender, TrySendError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::ConfigError;

use super::{Frame, FrameError, FrameSource, SamplingClock};

/// Pause between reads in headless mode so a device that returns instantly
/// does not spin a core.
const HEADLESS_PAUSE: Duration = Duration::from_millis(10);

/// Back-off after a failed read.
const READ_RETRY_PAUSE: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// CaptureDevice trait
// ---------------------------------------------------------------------------

/// A frame-producing device driven by the capture thread.
///
/// Implementations keep the most recently grabbed frame internally; only
/// sampled frames pay for [`encode`](Self::encode).
pub trait CaptureDevice: Send + 'static {
    /// Raw frame handed to the preview window.
    type Preview: Send + 'static;

    /// Read the next frame from the device into the internal buffer.
    fn grab(&mut self) -> Result<(), FrameError>;

    /// Encode the last grabbed frame.
    fn encode(&mut self, captured_at: Instant) -> Result<Frame, FrameError>;

    /// Copy of the last grabbed frame for the preview window.
    fn preview_frame(&mut self) -> Option<Self::Preview>;
}

// ---------------------------------------------------------------------------
// CaptureOptions
// ---------------------------------------------------------------------------

pub struct CaptureOptions<P> {
    pub interval: Duration,
    /// `Some` publishes every grabbed frame to the preview window.
    pub preview: Option<SyncSender<P>>,
    /// Stops the capture thread when cancelled.
    pub cancel: CancellationToken,
}

// ---------------------------------------------------------------------------
// CameraFrames
// ---------------------------------------------------------------------------

/// Async side of the capture thread.  Implements [`FrameSource`].
///
/// Dropping it stops the thread and waits for the device to be released.
pub struct CameraFrames {
    rx: watch::Receiver<Option<Frame>>,
    stop: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl CameraFrames {
    /// Open a device on a new capture thread and start sampling.
    ///
    /// `open` runs on the capture thread; its error is handed back here so
    /// an unavailable camera is reported before the pipeline starts.
    ///
    /// # Errors
    ///
    /// Whatever `open` returns, or [`ConfigError::CaptureThread`] if the
    /// thread could not be spawned.
    pub fn spawn<D, F>(open: F, options: CaptureOptions<D::Preview>) -> Result<Self, ConfigError>
    where
        D: CaptureDevice,
        F: FnOnce() -> Result<D, ConfigError> + Send + 'static,
    {
        let (frame_tx, rx) = watch::channel::<Option<Frame>>(None);
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<Result<(), ConfigError>>(1);
        let stop = options.cancel.child_token();
        let thread_stop = stop.clone();

        let thread = std::thread::Builder::new()
            .name("camera-capture".into())
            .spawn(move || {
                let device = match open() {
                    Ok(device) => {
                        let _ = ready_tx.send(Ok(()));
                        device
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                capture_loop(
                    device,
                    SamplingClock::new(options.interval),
                    &frame_tx,
                    options.preview,
                    &thread_stop,
                );
            })
            .map_err(|e| ConfigError::CaptureThread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                rx,
                stop,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(ConfigError::CaptureThread(
                    "capture thread exited during start-up".into(),
                ))
            }
        }
    }
}

#[async_trait]
impl FrameSource for CameraFrames {
    async fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        if self.rx.changed().await.is_err() {
            // Sender dropped: the capture thread has finished.
            return Ok(None);
        }
        Ok(self.rx.borrow_and_update().clone())
    }
}

impl Drop for CameraFrames {
    fn drop(&mut self) {
        self.stop.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("camera: capture thread panicked");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Capture thread body
// ---------------------------------------------------------------------------

fn capture_loop<D: CaptureDevice>(
    mut device: D,
    mut clock: SamplingClock,
    frame_tx: &watch::Sender<Option<Frame>>,
    mut preview: Option<SyncSender<D::Preview>>,
    stop: &CancellationToken,
) {
    log::info!(
        "camera: capture started (sampling every {:.2}s)",
        clock.interval().as_secs_f64()
    );

    while !stop.is_cancelled() && !frame_tx.is_closed() {
        if let Err(e) = device.grab() {
            log::warn!("camera: {e}; dropping frame");
            std::thread::sleep(READ_RETRY_PAUSE);
            continue;
        }

        let now = Instant::now();
        if clock.try_sample(now) {
            match device.encode(now) {
                Ok(frame) => {
                    frame_tx.send_replace(Some(frame));
                }
                Err(e) => log::warn!("camera: {e}; dropping sampled frame"),
            }
        }

        match preview.as_ref() {
            Some(tx) => {
                if let Some(raw) = device.preview_frame() {
                    match tx.try_send(raw) {
                        Ok(()) | Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Disconnected(_)) => {
                            log::info!("camera: preview window closed");
                            preview = None;
                        }
                    }
                }
            }
            None => std::thread::sleep(HEADLESS_PAUSE),
        }
    }

    drop(device);
    log::info!("camera: capture stopped, device released");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
