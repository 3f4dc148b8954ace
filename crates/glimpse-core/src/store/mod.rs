//! Message-store contract.
//!
//! The authoritative record for every protected message lives in an
//! externally-owned store. This core reads it on every poll tick and mutates
//! it through exactly two operations, both monotonic and idempotent:
//!
//! - `mark_viewed` sets the first-view timestamp (and the countdown end, for
//!   timed policies) if and only if not already set;
//! - `mark_expired` flips the terminal flag; a no-op once set.
//!
//! Because both writes are commutative-idempotent, no lock is required
//! around the record: duplicate or racing calls converge on the same state.
//! Store updates may reach the viewer asynchronously; the engine's local
//! guards cover that propagation window.

mod memory;

pub use memory::MemoryStore;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::message::{MessageKey, ProtectedMediaMessage, ViewState};

/// Host-provided store of protected-media messages.
pub trait MessageStore: Send + Sync {
    /// Fetch the current record.
    fn get(&self, key: &MessageKey) -> Result<ProtectedMediaMessage, StoreError>;

    /// Record the first view at `at`. For a timed policy this also fixes the
    /// countdown end as `at + timer_seconds`, never to be recomputed.
    /// Returns the resulting state; a no-op when already viewed or expired.
    fn mark_viewed(&self, key: &MessageKey, at: DateTime<Utc>) -> Result<ViewState, StoreError>;

    /// Set the terminal expired flag. A no-op when already expired.
    fn mark_expired(&self, key: &MessageKey) -> Result<(), StoreError>;
}
