//! State shared by both viewing-mode controllers for one open session.

use chrono::{DateTime, Utc};

use crate::engine::{Countdown, ExpirationEngine, TickOutcome};
use crate::message::{MessageKey, ProtectedMediaMessage};

/// One viewer session: the record as read at open time, plus the countdown
/// once the media has resolved and rendering has begun.
#[derive(Debug)]
pub(crate) struct ViewSession {
    message: ProtectedMediaMessage,
    countdown: Option<Countdown>,
}

impl ViewSession {
    pub(crate) fn new(message: ProtectedMediaMessage) -> Self {
        Self {
            message,
            countdown: None,
        }
    }

    pub(crate) fn key(&self) -> MessageKey {
        self.message.key
    }

    /// Media has resolved and is on screen.
    pub(crate) fn is_rendering(&self) -> bool {
        self.countdown.is_some()
    }

    /// Consume the view and start the countdown (if the policy has one).
    /// Returns the initial integer remaining seconds for display.
    pub(crate) fn start(
        &mut self,
        engine: &mut ExpirationEngine,
        now: DateTime<Utc>,
    ) -> Option<u64> {
        let countdown = engine.start_view(&self.message, now);
        let secs = countdown.remaining_secs(now);
        self.countdown = Some(countdown);
        secs
    }

    pub(crate) fn tick(&mut self, engine: &mut ExpirationEngine, now: DateTime<Utc>) -> TickOutcome {
        match self.countdown.as_mut() {
            Some(countdown) => engine.tick(countdown, now),
            None => TickOutcome::default(),
        }
    }

    pub(crate) fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.countdown.as_ref().and_then(|c| c.remaining_secs(now))
    }

    /// True when ending this session must trigger the view-once expiration:
    /// media actually rendered, the policy is view-once, and expiration has
    /// not already been requested.
    pub(crate) fn consumes_on_end(&self) -> bool {
        self.message.policy.is_view_once()
            && self.countdown.as_ref().is_some_and(|c| !c.is_finished())
    }
}
