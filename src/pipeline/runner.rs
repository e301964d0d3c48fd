//! Camera loop — drives frame → caption → classify → announce.
//!
//! [`CameraLoop`] pulls frames from any [`FrameSource`], captions each one
//! through the process-wide [`SharedCaptioner`], classifies the caption and
//! lets the [`AnnouncementController`] decide whether to speak.
//!
//! # Loop flow
//!
//! ```text
//! cancel? ──yes──▶ stop
//!   │
//!   ▼
//! source.next_frame()
//!   ├─ Ok(None)        → source exhausted, cancel + stop
//!   ├─ Err(FrameError) → warn, next iteration
//!   └─ Ok(Some(frame))
//!         └─▶ captioner.caption(frame)
//!               ├─ Err → warn, skip cycle (cooldown untouched)
//!               └─ Ok  → classify → announcer.observe → status + log
//! ```
//!
//! Inference is awaited inline, so at most one caption request is ever in
//! flight from the loop.  Frames sampled meanwhile are replaced inside the
//! source (latest wins), never queued.

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::announce::{AnnouncementController, Announcement};
use crate::caption::{CaptionError, SharedCaptioner};
use crate::classify::{DetectionResult, KeywordSet};
use crate::frames::{Frame, FrameSource};

use super::state::SharedStatus;

// ---------------------------------------------------------------------------
// LoopSummary
// ---------------------------------------------------------------------------

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    /// Frames delivered by the source.
    pub frames: u64,
    /// Frames that produced a caption.
    pub captioned: u64,
    /// Captions classified as a shop.
    pub shops: u64,
    /// Times the phrase was handed to the speech sink.
    pub announcements: u64,
    pub caption_errors: u64,
    pub frame_errors: u64,
}

// ---------------------------------------------------------------------------
// CameraLoop
// ---------------------------------------------------------------------------

pub struct CameraLoop {
    source: Box<dyn FrameSource>,
    captioner: SharedCaptioner,
    keywords: KeywordSet,
    announcer: AnnouncementController,
    status: SharedStatus,
    last: Option<DetectionResult>,
}

impl CameraLoop {
    pub fn new(
        source: Box<dyn FrameSource>,
        captioner: SharedCaptioner,
        keywords: KeywordSet,
        announcer: AnnouncementController,
        status: SharedStatus,
    ) -> Self {
        Self {
            source,
            captioner,
            keywords,
            announcer,
            status,
            last: None,
        }
    }

    /// Run until `cancel` fires or the source runs out of frames.
    ///
    /// The token is checked once per iteration and also raced against the
    /// pending frame or caption, so Ctrl-C never waits on a slow model.
    /// When the source is exhausted the token is cancelled so that sibling
    /// tasks (the Ctrl-C watcher, the preview) wind down too.
    pub async fn run(mut self, cancel: CancellationToken) -> (LoopSummary, Option<DetectionResult>) {
        let mut summary = LoopSummary::default();

        loop {
            if cancel.is_cancelled() {
                log::info!("pipeline: cancelled");
                break;
            }

            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("pipeline: cancelled while waiting for a frame");
                    break;
                }
                next = self.source.next_frame() => next,
            };

            let frame = match next {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("pipeline: frame source exhausted");
                    cancel.cancel();
                    break;
                }
                Err(e) => {
                    log::warn!("pipeline: {e}; frame dropped");
                    summary.frame_errors += 1;
                    continue;
                }
            };
            summary.frames += 1;

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("pipeline: cancelled during captioning");
                    break;
                }
                outcome = self.process(&frame) => outcome,
            };

            match outcome {
                Ok((result, announcement)) => {
                    summary.captioned += 1;
                    if result.is_shop {
                        summary.shops += 1;
                    }
                    if announcement.is_announced() {
                        summary.announcements += 1;
                    }
                    self.last = Some(result);
                }
                Err(e) => {
                    log::warn!("pipeline: caption failed ({e}); skipping cycle");
                    summary.caption_errors += 1;
                }
            }
        }

        log::info!(
            "pipeline: stopped after {} frames ({} captioned, {} shops, {} announced)",
            summary.frames,
            summary.captioned,
            summary.shops,
            summary.announcements
        );
        (summary, self.last)
    }

    /// One detection cycle.  The frame's capture time is the observation
    /// time handed to the cooldown controller.
    async fn process(
        &mut self,
        frame: &Frame,
    ) -> Result<(DetectionResult, Announcement), CaptionError> {
        let caption = self.captioner.caption(frame).await?;
        let result = DetectionResult::from_caption(caption, &self.keywords, Utc::now());
        let announcement = self.announcer.observe(&result, frame.captured_at);

        log::info!(
            "pipeline: [{}] {:?} shop={} score={} matched={:?}",
            announcement.label(),
            result.caption,
            result.is_shop,
            result.score,
            result.matched_keywords
        );

        match self.status.lock() {
            Ok(mut status) => status.record(&result, announcement),
            Err(poisoned) => poisoned.into_inner().record(&result, announcement),
        }

        Ok((result, announcement))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use image::ImageFormat;

    use super::*;
    use crate::caption::MockCaptionEngine;
    use crate::frames::frame::tests::tiny_png;
    use crate::frames::{FrameError, ImageSource};
    use crate::pipeline::state::new_shared_status;
    use crate::speech::RecordingSpeaker;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Replays a fixed script, then reports end of stream.
    struct ScriptedSource(VecDeque<Result<Option<Frame>, FrameError>>);

    #[async_trait]
    impl FrameSource for ScriptedSource {
        async fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    /// Never yields a frame.
    struct StalledSource;

    #[async_trait]
    impl FrameSource for StalledSource {
        async fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
            std::future::pending().await
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn frame_at(at: Instant) -> Frame {
        Frame::encoded(tiny_png(), ImageFormat::Png, at)
    }

    /// Frames at t0, t0+2s, … t0+10s.
    fn every_two_seconds(t0: Instant) -> ScriptedSource {
        ScriptedSource(
            (0..=5)
                .map(|i| Ok(Some(frame_at(t0 + Duration::from_secs(i * 2)))))
                .collect(),
        )
    }

    fn make_loop(
        source: impl FrameSource + 'static,
        engine: MockCaptionEngine,
    ) -> (CameraLoop, Arc<RecordingSpeaker>, SharedStatus) {
        let speaker = Arc::new(RecordingSpeaker::default());
        let status = new_shared_status();
        let announcer =
            AnnouncementController::new(Duration::from_secs(10), "This is a shop", speaker.clone());
        let camera_loop = CameraLoop::new(
            Box::new(source),
            SharedCaptioner::new(Arc::new(engine)),
            KeywordSet::default(),
            announcer,
            status.clone(),
        );
        (camera_loop, speaker, status)
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn cooldown_timeline_announces_twice() {
        let t0 = Instant::now();
        let (camera_loop, speaker, _) =
            make_loop(every_two_seconds(t0), MockCaptionEngine::ok("a grocery store"));

        let (summary, last) = camera_loop.run(CancellationToken::new()).await;

        assert_eq!(summary.frames, 6);
        assert_eq!(summary.shops, 6);
        assert_eq!(summary.announcements, 2);
        assert_eq!(speaker.spoken(), ["This is a shop", "This is a shop"]);
        assert!(last.is_some_and(|r| r.is_shop));
    }

    #[tokio::test]
    async fn negative_captions_never_speak() {
        let t0 = Instant::now();
        let (camera_loop, speaker, status) = make_loop(
            every_two_seconds(t0),
            MockCaptionEngine::ok("a dog running in a park"),
        );

        let (summary, _) = camera_loop.run(CancellationToken::new()).await;

        assert_eq!(summary.captioned, 6);
        assert_eq!(summary.shops, 0);
        assert!(speaker.spoken().is_empty());
        assert_eq!(status.lock().unwrap().label, "READY");
    }

    #[tokio::test]
    async fn caption_error_skips_cycle_and_leaves_cooldown_alone() {
        let t0 = Instant::now();
        let engine = MockCaptionEngine::script(vec![
            Err(CaptionError::Timeout),
            Ok("a small shop".into()),
            Err(CaptionError::Status(503)),
            Ok("a small shop".into()),
        ]);
        let source = ScriptedSource(
            [0, 2, 8, 10]
                .into_iter()
                .map(|s| Ok(Some(frame_at(t0 + Duration::from_secs(s)))))
                .collect(),
        );
        let (camera_loop, speaker, _) = make_loop(source, engine);

        let (summary, _) = camera_loop.run(CancellationToken::new()).await;

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.caption_errors, 2);
        assert_eq!(summary.captioned, 2);
        // First positive at t=2 announces; the one at t=10 is still inside 2+10.
        assert_eq!(summary.announcements, 1);
        assert_eq!(speaker.spoken().len(), 1);
    }

    #[tokio::test]
    async fn transient_frame_error_is_skipped() {
        let t0 = Instant::now();
        let source = ScriptedSource(VecDeque::from([
            Err(FrameError::Read("device busy".into())),
            Ok(Some(frame_at(t0))),
        ]));
        let (camera_loop, speaker, _) = make_loop(source, MockCaptionEngine::ok("a bakery"));

        let (summary, _) = camera_loop.run(CancellationToken::new()).await;

        assert_eq!(summary.frame_errors, 1);
        assert_eq!(summary.frames, 1);
        assert_eq!(speaker.spoken().len(), 1);
    }

    #[tokio::test]
    async fn image_source_runs_exactly_once_and_cancels() {
        let source = ImageSource::from_frame(Frame::decode(tiny_png()).unwrap());
        let (camera_loop, speaker, status) =
            make_loop(source, MockCaptionEngine::ok("a grocery store with shelves"));
        let cancel = CancellationToken::new();

        let (summary, last) = camera_loop.run(cancel.clone()).await;

        assert_eq!(summary.frames, 1);
        assert_eq!(summary.announcements, 1);
        assert_eq!(speaker.spoken().len(), 1);
        assert!(cancel.is_cancelled());

        let result = last.unwrap();
        assert_eq!(result.matched_keywords, ["store", "grocery"]);
        assert_eq!(status.lock().unwrap().label, "DETECTED SHOP");
    }

    #[tokio::test]
    async fn pre_cancelled_token_stops_before_first_frame() {
        let t0 = Instant::now();
        let engine = MockCaptionEngine::ok("a shop");
        let (camera_loop, speaker, _) = make_loop(every_two_seconds(t0), engine);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (summary, last) = camera_loop.run(cancel).await;

        assert_eq!(summary, LoopSummary::default());
        assert!(last.is_none());
        assert!(speaker.spoken().is_empty());
    }

    #[tokio::test]
    async fn cancel_interrupts_a_stalled_source() {
        let (camera_loop, _, _) = make_loop(StalledSource, MockCaptionEngine::ok("a shop"));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(camera_loop.run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let (summary, _) = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop promptly")
            .unwrap();
        assert_eq!(summary.frames, 0);
    }

    #[tokio::test]
    async fn cancel_interrupts_slow_caption() {
        let t0 = Instant::now();
        let engine = MockCaptionEngine::ok("a shop").with_delay(Duration::from_secs(30));
        let (camera_loop, speaker, _) = make_loop(every_two_seconds(t0), engine);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(camera_loop.run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let (summary, _) = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop promptly")
            .unwrap();
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.captioned, 0);
        assert!(speaker.spoken().is_empty());
    }
}
