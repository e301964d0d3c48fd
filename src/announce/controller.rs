//! Cooldown state machine and the controller that drives speech from it.
//!
//! ```text
//! Idle ──positive──▶ Cooldown { until: now + cooldown }   (announce)
//! Cooldown ──positive, now <  until──▶ Cooldown            (suppress)
//! Cooldown ──positive, now >= until──▶ Cooldown { until: now + cooldown }   (announce)
//! any ──positive, now + cooldown not representable──▶ Silenced   (announce)
//! Silenced ──positive──▶ Silenced                                 (suppress)
//! any ──negative──▶ unchanged
//! ```
//!
//! Expiry is lazy: there is no timer, the deadline is only compared when the
//! next positive result arrives.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::classify::DetectionResult;
use crate::speech::SpeechSink;

// ---------------------------------------------------------------------------
// CooldownState / Announcement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CooldownState {
    #[default]
    Idle,
    Cooldown {
        until: Instant,
    },
    /// The cooldown ends beyond what `Instant` can hold: never announce again.
    Silenced,
}

/// Outcome of observing one detection result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announcement {
    /// Positive result; the phrase was handed to the speech sink.
    Announced,
    /// Positive result inside the cooldown window; nothing spoken.
    Suppressed { remaining: Duration },
    /// Negative result.
    NotShop,
}

impl Announcement {
    /// Short status label for logs and the preview HUD.
    ///
    /// ```
    /// use std::time::Duration;
    /// use shop_detector::announce::Announcement;
    ///
    /// assert_eq!(Announcement::Announced.label(), "DETECTED SHOP");
    /// let suppressed = Announcement::Suppressed { remaining: Duration::from_millis(3_200) };
    /// assert_eq!(suppressed.label(), "DETECTED (cooldown 4s)");
    /// assert_eq!(Announcement::NotShop.label(), "READY");
    /// ```
    pub fn label(&self) -> String {
        match self {
            Announcement::Announced => "DETECTED SHOP".to_string(),
            Announcement::Suppressed { remaining } => {
                format!("DETECTED (cooldown {}s)", remaining.as_secs_f64().ceil() as u64)
            }
            Announcement::NotShop => "READY".to_string(),
        }
    }

    pub fn is_announced(&self) -> bool {
        matches!(self, Announcement::Announced)
    }
}

/// Pure transition function.
pub fn transition(
    state: CooldownState,
    is_shop: bool,
    now: Instant,
    cooldown: Duration,
) -> (CooldownState, Announcement) {
    if !is_shop {
        return (state, Announcement::NotShop);
    }

    match state {
        CooldownState::Cooldown { until } if now < until => (
            state,
            Announcement::Suppressed {
                remaining: until - now,
            },
        ),
        CooldownState::Silenced => (
            state,
            Announcement::Suppressed {
                remaining: Duration::MAX,
            },
        ),
        CooldownState::Idle | CooldownState::Cooldown { .. } => {
            let next = match now.checked_add(cooldown) {
                Some(until) => CooldownState::Cooldown { until },
                None => CooldownState::Silenced,
            };
            (next, Announcement::Announced)
        }
    }
}

// ---------------------------------------------------------------------------
// AnnouncementController
// ---------------------------------------------------------------------------

/// Owns the cooldown state for one camera loop.
///
/// Not shared: the HTTP facade never announces.
pub struct AnnouncementController {
    cooldown: Duration,
    phrase: String,
    sink: Arc<dyn SpeechSink>,
    state: CooldownState,
    last_announced_at: Option<Instant>,
}

impl AnnouncementController {
    pub fn new(cooldown: Duration, phrase: impl Into<String>, sink: Arc<dyn SpeechSink>) -> Self {
        Self {
            cooldown,
            phrase: phrase.into(),
            sink,
            state: CooldownState::Idle,
            last_announced_at: None,
        }
    }

    /// Feed one detection result observed at `now`.
    ///
    /// The state is committed before the sink is called, so a speech failure
    /// is logged but never reopens the window.
    pub fn observe(&mut self, result: &DetectionResult, now: Instant) -> Announcement {
        let (next, announcement) = transition(self.state, result.is_shop, now, self.cooldown);
        self.state = next;

        if announcement.is_announced() {
            self.last_announced_at = Some(now);
            if let Err(e) = self.sink.say(&self.phrase) {
                log::warn!("announce: speech failed: {e}");
            }
        }

        announcement
    }

    pub fn state(&self) -> CooldownState {
        self.state
    }

    pub fn last_announced_at(&self) -> Option<Instant> {
        self.last_announced_at
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
