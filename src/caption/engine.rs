//! Core caption engine trait, the single-flight wrapper, and a test double.
//!
//! # Overview
//!
//! [`CaptionEngine`] is the interface the pipeline and the HTTP handler
//! depend on.  It is object-safe and `Send + Sync` so it can be held behind
//! an `Arc<dyn CaptionEngine>`.
//!
//! The underlying model is one process-wide, stateful instance, so every
//! call goes through [`SharedCaptioner`], which holds a mutual-exclusion
//! gate around the engine: at most one caption request is in flight, and
//! concurrent callers queue (without timeout) behind it.
//!
//! [`MockCaptionEngine`] (available under `#[cfg(test)]`) returns scripted
//! captions and errors without any network access.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::frames::Frame;

// ---------------------------------------------------------------------------
// CaptionError
// ---------------------------------------------------------------------------

/// Inference failures.  Always recoverable: the camera loop skips the cycle
/// and the HTTP handler answers with a server error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptionError {
    /// Transport or connection failure reaching the captioning model.
    #[error("caption request failed: {0}")]
    Request(String),

    /// The model did not answer within the configured timeout.
    #[error("caption request timed out")]
    Timeout,

    /// The model service answered with a non-success HTTP status.
    #[error("caption service returned HTTP {0}")]
    Status(u16),

    /// The response body could not be parsed.
    #[error("failed to parse caption response: {0}")]
    Parse(String),

    /// The model answered without any caption text.
    #[error("caption service returned an empty caption")]
    EmptyResponse,
}

impl From<reqwest::Error> for CaptionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CaptionError::Timeout
        } else if let Some(status) = e.status() {
            CaptionError::Status(status.as_u16())
        } else {
            CaptionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// CaptionEngine trait
// ---------------------------------------------------------------------------

/// Produces the single best caption for one image.
///
/// Potentially slow (sub-second to several seconds).  Implementations need
/// not be reentrant; callers go through [`SharedCaptioner`].
#[async_trait]
pub trait CaptionEngine: Send + Sync {
    async fn caption(&self, frame: &Frame) -> Result<String, CaptionError>;
}

// Compile-time assertion: Box<dyn CaptionEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn CaptionEngine>) {}
};

// ---------------------------------------------------------------------------
// SharedCaptioner
// ---------------------------------------------------------------------------

/// Cheap-to-clone, single-flight handle to the process-wide engine.
///
/// Constructed once at startup and passed explicitly to whichever facade
/// needs it.
#[derive(Clone)]
pub struct SharedCaptioner {
    engine: Arc<dyn CaptionEngine>,
    gate: Arc<Mutex<()>>,
}

impl SharedCaptioner {
    pub fn new(engine: Arc<dyn CaptionEngine>) -> Self {
        Self {
            engine,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Caption `frame`, waiting for any in-flight request to finish first.
    pub async fn caption(&self, frame: &Frame) -> Result<String, CaptionError> {
        let _in_flight = self.gate.lock().await;
        self.engine.caption(frame).await
    }
}

impl std::fmt::Debug for SharedCaptioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCaptioner").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// MockCaptionEngine  (test-only)
// ---------------------------------------------------------------------------

/// Test double replaying a script of responses.
///
/// Each call consumes the next scripted response; once the script runs out
/// the last response repeats.
#[cfg(test)]
pub struct MockCaptionEngine {
    script: std::sync::Mutex<std::collections::VecDeque<Result<String, CaptionError>>>,
    last: std::sync::Mutex<Result<String, CaptionError>>,
    delay: std::time::Duration,
    calls: std::sync::atomic::AtomicUsize,
    in_flight: std::sync::atomic::AtomicUsize,
    max_in_flight: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockCaptionEngine {
    /// Always returns `Ok(text)`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self::script(vec![Ok(text.into())])
    }

    /// Always returns `Err(error)`.
    pub fn err(error: CaptionError) -> Self {
        Self::script(vec![Err(error)])
    }

    /// Replays `responses` in order, then repeats the last one.
    pub fn script(responses: Vec<Result<String, CaptionError>>) -> Self {
        let last = responses
            .last()
            .cloned()
            .unwrap_or(Err(CaptionError::EmptyResponse));
        Self {
            script: std::sync::Mutex::new(responses.into()),
            last: std::sync::Mutex::new(last),
            delay: std::time::Duration::ZERO,
            calls: Default::default(),
            in_flight: Default::default(),
            max_in_flight: Default::default(),
        }
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Highest number of overlapping calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl CaptionEngine for MockCaptionEngine {
    async fn caption(&self, _frame: &Frame) -> Result<String, CaptionError> {
        use std::sync::atomic::Ordering;

        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        let response = match next {
            Some(r) => {
                *self.last.lock().unwrap() = r.clone();
                r
            }
            None => self.last.lock().unwrap().clone(),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
