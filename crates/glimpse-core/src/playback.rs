//! Playback resume calculation for video media.
//!
//! Converts wall-clock time elapsed since the first view into a position in
//! the clip's own timeline, so a video reopened mid-allowance resumes
//! instead of restarting. Pure reads; the viewer computes this once per
//! open to avoid seek thrashing.

use chrono::{DateTime, Utc};

use crate::message::ProtectedMediaMessage;

/// Wall-clock milliseconds consumed from the countdown allowance.
///
/// `0` when the message has no countdown end (not yet viewed, or a
/// view-once policy -- there is nothing to resume). Never exceeds the
/// policy allowance.
pub fn elapsed_ms(message: &ProtectedMediaMessage, now: DateTime<Utc>) -> u64 {
    match message.remaining_ms(now) {
        Some(remaining) => message.policy.duration_ms().saturating_sub(remaining),
        None => 0,
    }
}

/// Position within the clip at which playback should start, in
/// milliseconds: the elapsed allowance wrapped around the clip length, so a
/// long countdown against a short clip cycles naturally.
pub fn resume_position_ms(
    message: &ProtectedMediaMessage,
    video_duration_ms: u64,
    now: DateTime<Utc>,
) -> u64 {
    if video_duration_ms == 0 {
        return 0;
    }
    elapsed_ms(message, now) % video_duration_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{
        MediaKind, MediaRef, MessageKey, ProtectedMediaPolicy, ViewState, ViewingMode,
    };
    use chrono::Duration;
    use proptest::prelude::*;

    fn video_message(timer_seconds: u32, state: ViewState) -> ProtectedMediaMessage {
        ProtectedMediaMessage {
            key: MessageKey::generate(),
            policy: ProtectedMediaPolicy {
                timer_seconds,
                viewing_mode: ViewingMode::Tap,
                media_kind: MediaKind::Video,
                media_location: MediaRef("media://clip".into()),
            },
            state,
        }
    }

    #[test]
    fn unviewed_message_starts_at_zero() {
        let msg = video_message(10, ViewState::NotViewed);
        assert_eq!(resume_position_ms(&msg, 4000, Utc::now()), 0);
    }

    #[test]
    fn view_once_has_nothing_to_resume() {
        let viewed_at = Utc::now();
        let msg = video_message(
            0,
            ViewState::Viewing {
                viewed_at,
                ends_at: None,
            },
        );
        assert_eq!(elapsed_ms(&msg, viewed_at + Duration::seconds(3)), 0);
    }

    #[test]
    fn resume_wraps_around_the_clip() {
        // 10s allowance, 4s clip, reopened with 3s remaining: elapsed 7s,
        // one full 4s loop plus 3s into the second.
        let viewed_at = Utc::now();
        let msg = video_message(
            10,
            ViewState::Viewing {
                viewed_at,
                ends_at: Some(viewed_at + Duration::seconds(10)),
            },
        );
        let now = viewed_at + Duration::seconds(7);
        assert_eq!(msg.remaining_ms(now), Some(3000));
        assert_eq!(elapsed_ms(&msg, now), 7000);
        assert_eq!(resume_position_ms(&msg, 4000, now), 3000);

        // A second example past two full loops: elapsed 9s resumes at 1s.
        let now = viewed_at + Duration::seconds(9);
        assert_eq!(resume_position_ms(&msg, 4000, now), 1000);
    }

    #[test]
    fn elapsed_caps_at_the_allowance() {
        let viewed_at = Utc::now();
        let msg = video_message(
            5,
            ViewState::Viewing {
                viewed_at,
                ends_at: Some(viewed_at + Duration::seconds(5)),
            },
        );
        assert_eq!(elapsed_ms(&msg, viewed_at + Duration::seconds(60)), 5000);
    }

    #[test]
    fn zero_length_clip_resumes_at_zero() {
        let viewed_at = Utc::now();
        let msg = video_message(
            10,
            ViewState::Viewing {
                viewed_at,
                ends_at: Some(viewed_at + Duration::seconds(10)),
            },
        );
        assert_eq!(resume_position_ms(&msg, 0, viewed_at), 0);
    }

    proptest! {
        #[test]
        fn resume_equals_elapsed_mod_duration(
            timer_seconds in 1u32..3600,
            elapsed_offset_ms in 0u64..4_000_000,
            video_duration_ms in 1u64..600_000,
        ) {
            let viewed_at = Utc::now();
            let msg = video_message(
                timer_seconds,
                ViewState::Viewing {
                    viewed_at,
                    ends_at: Some(viewed_at + Duration::seconds(i64::from(timer_seconds))),
                },
            );
            let now = viewed_at + Duration::milliseconds(elapsed_offset_ms as i64);
            let elapsed = elapsed_ms(&msg, now);
            prop_assert!(elapsed <= msg.policy.duration_ms());
            prop_assert_eq!(
                resume_position_ms(&msg, video_duration_ms, now),
                elapsed % video_duration_ms
            );
        }
    }
}
