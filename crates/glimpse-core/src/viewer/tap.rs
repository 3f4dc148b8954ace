//! Tap viewing mode: discrete open and close actions.

use chrono::{DateTime, Utc};

use crate::engine::{OpenCheck, SharedEngine};
use crate::error::Result;
use crate::events::{CloseReason, RejectReason, ViewerEvent};
use crate::message::MessageKey;
use crate::viewer::session::ViewSession;
use crate::viewer::Pollable;

/// Where the tap viewer currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapPhase {
    Closed,
    /// Session accepted, media reference still resolving. No view has been
    /// consumed yet.
    Opening,
    /// Media on screen; countdown (if any) running.
    Open,
}

/// Tap-mode viewer controller. `Closed -> Opening -> Open -> Closed`.
///
/// Closing always tears the countdown poll down. For view-once media the
/// first close of a rendered view requests `mark_expired`; taking the
/// session out of the controller is what makes a close-button/back-gesture
/// race harmless, because the second close finds nothing to act on.
pub struct TapController {
    engine: SharedEngine,
    session: Option<ViewSession>,
}

impl TapController {
    pub fn new(engine: SharedEngine) -> Self {
        Self {
            engine,
            session: None,
        }
    }

    pub fn phase(&self) -> TapPhase {
        match &self.session {
            None => TapPhase::Closed,
            Some(session) if session.is_rendering() => TapPhase::Open,
            Some(_) => TapPhase::Opening,
        }
    }

    pub fn key(&self) -> Option<MessageKey> {
        self.session.as_ref().map(|s| s.key())
    }

    /// Remaining whole seconds for on-screen display.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.session.as_ref().and_then(|s| s.remaining_secs(now))
    }

    /// Open the viewer for a message. Returns `None` when a session is
    /// already active.
    pub fn open(&mut self, key: MessageKey, now: DateTime<Utc>) -> Result<Option<ViewerEvent>> {
        if self.session.is_some() {
            return Ok(None);
        }
        let check = self.engine.lock().unwrap().check_open(&key)?;
        let event = match check {
            OpenCheck::Expired => ViewerEvent::ViewRejected {
                key,
                reason: RejectReason::AlreadyExpired,
                at: now,
            },
            OpenCheck::Consumed => ViewerEvent::ViewRejected {
                key,
                reason: RejectReason::AlreadyConsumed,
                at: now,
            },
            OpenCheck::Viewable(message) => {
                let media_kind = message.policy.media_kind;
                self.session = Some(ViewSession::new(message));
                ViewerEvent::ViewOpened {
                    key,
                    media_kind,
                    at: now,
                }
            }
        };
        Ok(Some(event))
    }

    /// The host resolved the media reference: rendering begins, the view is
    /// consumed and the countdown starts.
    pub fn media_ready(&mut self, now: DateTime<Utc>) -> Option<ViewerEvent> {
        let rendering = self.session.as_ref().map(|s| s.is_rendering())?;
        if rendering {
            return None;
        }
        let mut engine = self.engine.lock().unwrap();
        let key = self.session.as_ref()?.key();
        // The record may have turned terminal while the media resolved.
        if engine.store_expired(&key) {
            self.session = None;
            return Some(ViewerEvent::ViewClosed {
                key,
                reason: CloseReason::Expired,
                at: now,
            });
        }
        let session = self.session.as_mut()?;
        let remaining_secs = session.start(&mut engine, now);
        Some(ViewerEvent::MediaShown {
            key,
            remaining_secs,
            at: now,
        })
    }

    /// The media reference could not be resolved. The session closes to a
    /// placeholder without consuming the view or starting any countdown.
    pub fn media_failed(&mut self, now: DateTime<Utc>) -> Option<ViewerEvent> {
        if self.session.as_ref()?.is_rendering() {
            return None;
        }
        let session = self.session.take()?;
        Some(ViewerEvent::ViewClosed {
            key: session.key(),
            reason: CloseReason::MediaFailed,
            at: now,
        })
    }

    /// Periodic poll. Re-checks the store guard, advances the countdown,
    /// and force-closes on expiry.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<ViewerEvent> {
        let key = self.session.as_ref()?.key();
        let mut engine = self.engine.lock().unwrap();
        if engine.store_expired(&key) {
            self.session = None;
            return Some(ViewerEvent::ViewClosed {
                key,
                reason: CloseReason::Expired,
                at: now,
            });
        }
        let session = self.session.as_mut()?;
        let outcome = session.tick(&mut engine, now);
        if outcome.expired {
            self.session = None;
            return Some(ViewerEvent::ViewClosed {
                key,
                reason: CloseReason::Expired,
                at: now,
            });
        }
        outcome.remaining_secs.map(|remaining_secs| ViewerEvent::CountdownTick {
            key,
            remaining_secs,
            at: now,
        })
    }

    /// Close the viewer (close button, back gesture, host unmount).
    /// Idempotent; the first close of a rendered view-once view expires it.
    pub fn close(&mut self, now: DateTime<Utc>) -> Option<ViewerEvent> {
        let session = self.session.take()?;
        if session.consumes_on_end() {
            self.engine.lock().unwrap().request_expire(&session.key());
        }
        Some(ViewerEvent::ViewClosed {
            key: session.key(),
            reason: CloseReason::Dismissed,
            at: now,
        })
    }
}

impl Pollable for TapController {
    fn poll(&mut self, now: DateTime<Utc>) -> Option<ViewerEvent> {
        self.tick(now)
    }

    fn is_idle(&self) -> bool {
        self.session.is_none()
    }
}
