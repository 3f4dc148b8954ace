//! # Glimpse Core Library
//!
//! Core engine for Glimpse's ephemeral media messages: a sender attaches a
//! self-expiring photo or video to a conversation message, and this library
//! guarantees the receiver sees it for at most its configured allowance --
//! exactly once if configured as view-once -- across viewer close/reopen,
//! app restarts, and list re-renders, without ever re-arming a consumed
//! view. The host application supplies rendering, media transport, and the
//! authoritative message store; this crate supplies the state machines.
//!
//! ## Architecture
//!
//! - **Expiration Engine**: A wall-clock-based state machine that requires
//!   the caller to periodically invoke `tick()` for progress updates
//! - **Viewing Mode Controllers**: Tap (open/close) and Hold
//!   (press/release) variants deciding when a view starts and ends
//! - **Playback Resume**: Converts wall-clock elapsed time into a position
//!   within a video's own timeline
//! - **Message Store**: Trait contract for the host's message table, plus
//!   an in-memory reference implementation
//!
//! ## Key Components
//!
//! - [`ExpirationEngine`]: Countdown derivation, consumption, terminal
//!   transitions
//! - [`TapController`] / [`HoldController`]: Interaction state machines
//! - [`CountdownDriver`]: One periodic poll task per open viewer
//! - [`ViewerConfig`]: Polling cadence and guard-structure bounds

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod events;
pub mod message;
pub mod playback;
pub mod store;
pub mod viewer;

pub use config::ViewerConfig;
pub use driver::CountdownDriver;
pub use engine::{shared, Countdown, ExpirationEngine, OpenCheck, SharedEngine, TickOutcome};
pub use error::{ConfigError, CoreError, Result, StoreError};
pub use events::{CloseReason, RejectReason, ViewerEvent};
pub use message::{
    ConversationId, MediaKind, MediaRef, MessageId, MessageKey, ProtectedMediaMessage,
    ProtectedMediaPolicy, ViewState, ViewingMode,
};
pub use playback::{elapsed_ms, resume_position_ms};
pub use store::{MemoryStore, MessageStore};
pub use viewer::{HoldController, HoldPhase, Pollable, TapController, TapPhase};
