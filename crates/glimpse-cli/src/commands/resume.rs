//! Video playback resume calculation.

use chrono::{Duration, Utc};
use clap::Args;
use glimpse_core::{
    elapsed_ms, resume_position_ms, MediaKind, MediaRef, MessageKey, ProtectedMediaMessage,
    ProtectedMediaPolicy, ViewState, ViewingMode,
};
use serde::Serialize;

#[derive(Args)]
pub struct ResumeArgs {
    /// Countdown allowance in seconds
    #[arg(long)]
    pub timer: u32,
    /// Clip length in milliseconds
    #[arg(long)]
    pub video_ms: u64,
    /// Milliseconds since the message was first viewed
    #[arg(long)]
    pub viewed_ago_ms: u64,
}

#[derive(Serialize)]
struct ResumeReport {
    elapsed_ms: u64,
    remaining_ms: u64,
    resume_position_ms: u64,
}

pub fn run(args: ResumeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let viewed_at = now - Duration::milliseconds(args.viewed_ago_ms as i64);
    let policy = ProtectedMediaPolicy {
        timer_seconds: args.timer,
        viewing_mode: ViewingMode::Tap,
        media_kind: MediaKind::Video,
        media_location: MediaRef("media://clip".into()),
    };
    let message = ProtectedMediaMessage {
        key: MessageKey::generate(),
        state: ViewState::viewing(viewed_at, &policy),
        policy,
    };

    let report = ResumeReport {
        elapsed_ms: elapsed_ms(&message, now),
        remaining_ms: message.remaining_ms(now).unwrap_or(0),
        resume_position_ms: resume_position_ms(&message, args.video_ms, now),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
