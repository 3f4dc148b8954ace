//! Protected-media message model.
//!
//! A protected message is an immutable [`ProtectedMediaPolicy`] (set once by
//! the sender) plus a mutable [`ViewState`] owned by the message store. The
//! viewing state is deliberately a tagged enum rather than three independent
//! optional fields, so that illegal combinations (a timed message with an end
//! time but no first-view time, for instance) cannot be constructed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a conversation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub Uuid);

impl ConversationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Identifier of a single message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Fully-qualified address of a protected message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKey {
    pub conversation: ConversationId,
    pub message: MessageId,
}

impl MessageKey {
    pub fn generate() -> Self {
        Self {
            conversation: ConversationId::generate(),
            message: MessageId::generate(),
        }
    }
}

impl std::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.conversation.0, self.message.0)
    }
}

/// How the viewer is opened and closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewingMode {
    /// Discrete open and close actions.
    Tap,
    /// Visible only while a press is sustained; ends on release.
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

/// Opaque reference to the media bytes. Resolved by the host, never
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef(pub String);

/// Immutable viewing policy, set once when the message is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedMediaPolicy {
    /// Countdown duration in seconds. `0` means view-once: there is no
    /// countdown and ending the viewing session is the expiration trigger.
    pub timer_seconds: u32,
    pub viewing_mode: ViewingMode,
    pub media_kind: MediaKind,
    pub media_location: MediaRef,
}

impl ProtectedMediaPolicy {
    pub fn is_view_once(&self) -> bool {
        self.timer_seconds == 0
    }

    /// Countdown allowance in milliseconds.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn duration_ms(&self) -> u64 {
        u64::from(self.timer_seconds).saturating_mul(1000)
    }
}

/// Mutable viewing state, owned by the message store.
///
/// `NotViewed -> Viewing -> Expired`, one-way only. `ends_at` is computed
/// exactly once (at first view, for timed policies) and never recomputed, so
/// the countdown survives close/reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewState {
    NotViewed,
    Viewing {
        viewed_at: DateTime<Utc>,
        /// Absent for view-once policies.
        ends_at: Option<DateTime<Utc>>,
    },
    Expired,
}

impl ViewState {
    /// The state a timed or view-once message enters on first view.
    pub fn viewing(viewed_at: DateTime<Utc>, policy: &ProtectedMediaPolicy) -> Self {
        let ends_at = (!policy.is_view_once())
            .then(|| viewed_at + Duration::seconds(i64::from(policy.timer_seconds)));
        ViewState::Viewing { viewed_at, ends_at }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, ViewState::Expired)
    }

    pub fn viewed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ViewState::Viewing { viewed_at, .. } => Some(*viewed_at),
            _ => None,
        }
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ViewState::Viewing { ends_at, .. } => *ends_at,
            _ => None,
        }
    }
}

/// A protected message as read from the store: address, policy, state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedMediaMessage {
    pub key: MessageKey,
    pub policy: ProtectedMediaPolicy,
    pub state: ViewState,
}

impl ProtectedMediaMessage {
    /// Wall-clock milliseconds left on the countdown, clamped at zero.
    ///
    /// `None` when no countdown exists for this message (not yet viewed, a
    /// view-once policy, or already expired).
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> Option<u64> {
        let ends_at = self.state.ends_at()?;
        Some((ends_at - now).num_milliseconds().max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(timer_seconds: u32) -> ProtectedMediaPolicy {
        ProtectedMediaPolicy {
            timer_seconds,
            viewing_mode: ViewingMode::Tap,
            media_kind: MediaKind::Photo,
            media_location: MediaRef("media://test".into()),
        }
    }

    #[test]
    fn timed_view_sets_ends_at_once() {
        let now = Utc::now();
        let state = ViewState::viewing(now, &policy(5));
        assert_eq!(state.viewed_at(), Some(now));
        assert_eq!(state.ends_at(), Some(now + Duration::seconds(5)));
    }

    #[test]
    fn view_once_has_no_ends_at() {
        let state = ViewState::viewing(Utc::now(), &policy(0));
        assert_eq!(state.ends_at(), None);
        assert!(!state.is_expired());
    }

    #[test]
    fn remaining_clamps_at_zero() {
        let now = Utc::now();
        let msg = ProtectedMediaMessage {
            key: MessageKey::generate(),
            policy: policy(2),
            state: ViewState::viewing(now, &policy(2)),
        };
        assert_eq!(msg.remaining_ms(now + Duration::seconds(10)), Some(0));
        assert_eq!(msg.remaining_ms(now), Some(2000));
    }

    #[test]
    fn state_serializes_with_status_tag() {
        let json = serde_json::to_string(&ViewState::NotViewed).unwrap();
        assert!(json.contains("not_viewed"));
        let back: ViewState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ViewState::NotViewed);
    }
}
