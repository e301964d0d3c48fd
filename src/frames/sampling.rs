//! Fixed-interval sampling against a continuously advancing capture stream.
//!
//! [`SamplingClock`] keeps a single "next eligible inference" instant.  The
//! capture thread asks [`SamplingClock::try_sample`] for every frame it
//! reads; only frames arriving at or after that instant are forwarded, and
//! forwarding pushes the instant one interval into the future.  No timer
//! or busy-wait is involved; the clock is pure and driven by frame times.
//!
//! An interval that pushes the instant past what `Instant` can represent
//! closes the gate for good.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Open,
    At(Instant),
    Closed,
}

#[derive(Debug, Clone)]
pub struct SamplingClock {
    interval: Duration,
    gate: Gate,
}

impl SamplingClock {
    /// The first frame offered is always eligible.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            gate: Gate::Open,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Instant from which the next frame will be forwarded.  `None` before
    /// the first sample and once the gate has closed.
    pub fn next_eligible(&self) -> Option<Instant> {
        match self.gate {
            Gate::At(at) => Some(at),
            Gate::Open | Gate::Closed => None,
        }
    }

    /// `true` once the interval has run past the end of the clock.
    pub fn is_closed(&self) -> bool {
        self.gate == Gate::Closed
    }

    /// `true` if a frame captured at `now` should be forwarded.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.gate {
            Gate::Open => true,
            Gate::At(at) => now >= at,
            Gate::Closed => false,
        }
    }

    /// Forward-or-discard decision for a frame captured at `now`.
    ///
    /// Returns `true` and advances the clock when the frame is due.
    pub fn try_sample(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.gate = match now.checked_add(self.interval) {
            Some(at) => Gate::At(at),
            None => {
                log::warn!("sampling: interval overflows the clock; no further frames");
                Gate::Closed
            }
        };
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
