//! Viewing-mode controllers.
//!
//! Two variants decide when, relative to user interaction, the expiration
//! engine is told that a view started and ended:
//!
//! - [`TapController`]: `Closed -> Opening -> Open -> Closed`. Discrete
//!   open/close actions; for view-once media, the first close expires it.
//! - [`HoldController`]: `Released -> Pressed -> Held -> Released`. Media is
//!   visible only while held; for view-once media, one complete
//!   hold/release cycle consumes it and later presses are rejected even
//!   before the store write propagates.
//!
//! Both are caller-polled: the host (or a [`crate::driver::CountdownDriver`])
//! invokes `tick(now)` on the configured cadence. Every tick re-reads the
//! store record and force-closes if it has turned terminal.

mod hold;
mod session;
mod tap;

pub use hold::{HoldController, HoldPhase};
pub use tap::{TapController, TapPhase};

use chrono::{DateTime, Utc};

use crate::events::ViewerEvent;

/// Anything the countdown driver can poll on a timer.
pub trait Pollable: Send {
    /// Advance one poll step. Equivalent to the controller's `tick`.
    fn poll(&mut self, now: DateTime<Utc>) -> Option<ViewerEvent>;

    /// True when no viewing session is active (the driver stops).
    fn is_idle(&self) -> bool;
}
