use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{MediaKind, MessageKey};

/// Why a viewing session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Explicit close action or hardware back gesture.
    Dismissed,
    /// Hold released.
    Released,
    /// The media reference could not be resolved; the view was not consumed.
    MediaFailed,
    /// Countdown reached zero, or the store record turned expired mid-view.
    Expired,
}

/// Why an open/press attempt was refused before any media rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The store record is already terminal.
    AlreadyExpired,
    /// A hold-and-release cycle already consumed this view-once message,
    /// even if the store write is not yet visible.
    AlreadyConsumed,
}

/// Every viewer state change produces an event.
/// The host UI polls the controller (or drains a driver channel) for these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewerEvent {
    /// A session was accepted; the media reference is still resolving, so
    /// nothing renders yet and no view has been consumed.
    ViewOpened {
        key: MessageKey,
        media_kind: MediaKind,
        at: DateTime<Utc>,
    },
    /// The media resolved and rendering begins; the view is now consumed
    /// and the countdown (if any) is running.
    MediaShown {
        key: MessageKey,
        remaining_secs: Option<u64>,
        at: DateTime<Utc>,
    },
    /// Integer remaining seconds changed. Emitted at most once per value.
    CountdownTick {
        key: MessageKey,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    ViewClosed {
        key: MessageKey,
        reason: CloseReason,
        at: DateTime<Utc>,
    },
    /// An open/press attempt was refused; the host renders the terminal
    /// "expired" placeholder instead of content.
    ViewRejected {
        key: MessageKey,
        reason: RejectReason,
        at: DateTime<Utc>,
    },
}

impl ViewerEvent {
    /// True when the host should show the terminal "expired" placeholder.
    pub fn is_expired_signal(&self) -> bool {
        matches!(
            self,
            ViewerEvent::ViewClosed {
                reason: CloseReason::Expired,
                ..
            } | ViewerEvent::ViewRejected { .. }
        )
    }
}
