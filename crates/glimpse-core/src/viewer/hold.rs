//! Hold viewing mode: media visible only while a press is sustained.

use chrono::{DateTime, Utc};

use crate::engine::{OpenCheck, SharedEngine};
use crate::error::Result;
use crate::events::{CloseReason, RejectReason, ViewerEvent};
use crate::message::MessageKey;
use crate::viewer::session::ViewSession;
use crate::viewer::Pollable;

/// Where the hold viewer currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPhase {
    Released,
    /// Press accepted, media reference still resolving. Nothing renders and
    /// no view has been consumed.
    Pressed,
    /// Media on screen for as long as the press is sustained.
    Held,
}

/// Hold-mode viewer controller. `Released -> Pressed -> Held -> Released`.
///
/// View-once media in this mode has a stronger hazard than tap: the user can
/// release and re-press faster than the store's expired write propagates.
/// Completed cycles are therefore recorded in the engine's consumed
/// registry, and a press for a registered id is rejected before any media
/// shows, independent of store timing.
pub struct HoldController {
    engine: SharedEngine,
    session: Option<ViewSession>,
}

impl HoldController {
    pub fn new(engine: SharedEngine) -> Self {
        Self {
            engine,
            session: None,
        }
    }

    pub fn phase(&self) -> HoldPhase {
        match &self.session {
            None => HoldPhase::Released,
            Some(session) if session.is_rendering() => HoldPhase::Held,
            Some(_) => HoldPhase::Pressed,
        }
    }

    pub fn key(&self) -> Option<MessageKey> {
        self.session.as_ref().map(|s| s.key())
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.session.as_ref().and_then(|s| s.remaining_secs(now))
    }

    /// Begin a press. Returns `None` when a press is already in progress.
    pub fn press(&mut self, key: MessageKey, now: DateTime<Utc>) -> Result<Option<ViewerEvent>> {
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

    /// The host resolved the media reference: the press becomes a hold,
    /// rendering begins, the view is consumed.
    pub fn media_ready(&mut self, now: DateTime<Utc>) -> Option<ViewerEvent> {
        let rendering = self.session.as_ref().map(|s| s.is_rendering())?;
        if rendering {
            return None;
        }
        let mut engine = self.engine.lock().unwrap();
        let key = self.session.as_ref()?.key();
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

    /// The media reference could not be resolved while pressed; release to
    /// placeholder without consuming the view.
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

    /// Periodic poll while pressed or held.
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

    /// End the press. For a rendered view-once view this completes the one
    /// hold/release cycle: the id goes into the consumed registry before
    /// the store write is even attempted, so an immediate re-press cannot
    /// sneak in under propagation latency. Timed media is not expired early;
    /// its countdown keeps governing and a later hold resumes it.
    pub fn release(&mut self, now: DateTime<Utc>) -> Option<ViewerEvent> {
        let session = self.session.take()?;
        if session.consumes_on_end() {
            let mut engine = self.engine.lock().unwrap();
            engine.note_consumed(session.key());
            engine.request_expire(&session.key());
        }
        Some(ViewerEvent::ViewClosed {
            key: session.key(),
            reason: CloseReason::Released,
            at: now,
        })
    }
}

impl Pollable for HoldController {
    fn poll(&mut self, now: DateTime<Utc>) -> Option<ViewerEvent> {
        self.tick(now)
    }

    fn is_idle(&self) -> bool {
        self.session.is_none()
    }
}
