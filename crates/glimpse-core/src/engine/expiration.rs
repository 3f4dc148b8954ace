//! Expiration engine.
//!
//! Wall-clock based and caller-ticked: there are no internal threads, and
//! the viewing-mode controllers invoke [`ExpirationEngine::tick`] on their
//! poll cadence. The engine decides when a view has been consumed, derives
//! remaining time from the write-once countdown end stored on the message,
//! and requests the two store transitions (`mark_viewed`, `mark_expired`).
//!
//! Store writes are durability, not gatekeeping: when one fails, the local
//! session state stays authoritative for presentation, the failure is
//! logged, and the write is queued for an opportunistic retry on a later
//! engine call.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::ViewerConfig;
use crate::engine::registry::ConsumedRegistry;
use crate::error::Result;
use crate::message::{MessageKey, ProtectedMediaMessage, ViewState};
use crate::store::MessageStore;

/// Outcome of [`ExpirationEngine::check_open`].
#[derive(Debug)]
pub enum OpenCheck {
    /// The message may be viewed; carries the freshly-read record.
    Viewable(ProtectedMediaMessage),
    /// The store record is terminal.
    Expired,
    /// A hold-and-release cycle already consumed this message; the store
    /// write may still be in flight.
    Consumed,
}

/// Per-view countdown state. Created by [`ExpirationEngine::start_view`]
/// and advanced by [`ExpirationEngine::tick`].
#[derive(Debug, Clone)]
pub struct Countdown {
    key: MessageKey,
    /// Absent for view-once policies (no countdown exists).
    ends_at: Option<DateTime<Utc>>,
    /// Last integer-seconds value handed to the caller; ticks at sub-second
    /// granularity coalesce against this.
    last_emitted_secs: Option<u64>,
    /// Latched once expiration has been requested, so polling overlap with
    /// store-update latency cannot fire the transition twice.
    expire_requested: bool,
}

impl Countdown {
    pub fn key(&self) -> MessageKey {
        self.key
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
    }

    /// Milliseconds left, clamped at zero. `None` when no countdown exists.
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> Option<u64> {
        self.ends_at
            .map(|ends_at| (ends_at - now).num_milliseconds().max(0) as u64)
    }

    /// Remaining whole seconds for on-screen display (ceiling, so the value
    /// only reaches 0 at the actual expiry instant).
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.remaining_ms(now).map(|ms| ms.div_ceil(1000))
    }

    /// True once expiration has been requested for this view.
    pub fn is_finished(&self) -> bool {
        self.expire_requested
    }
}

/// What a single poll tick produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Integer remaining seconds, present only when the value changed.
    pub remaining_secs: Option<u64>,
    /// The countdown reached zero on this tick; the caller must force-close
    /// the viewing session. Reported exactly once per countdown.
    pub expired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOp {
    Viewed { at: DateTime<Utc> },
    Expired,
}

#[derive(Debug, Clone, Copy)]
struct PendingWrite {
    key: MessageKey,
    op: WriteOp,
}

/// Long-lived engine instance, shared by every viewer the host opens.
///
/// Owns the consumed-id registry and the store-write retry queue; both are
/// session-scoped and bounded, because the store is the permanent record.
pub struct ExpirationEngine {
    store: Arc<dyn MessageStore>,
    consumed: ConsumedRegistry,
    retries: VecDeque<PendingWrite>,
    retry_capacity: usize,
}

impl ExpirationEngine {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self::with_config(store, &ViewerConfig::default())
    }

    pub fn with_config(store: Arc<dyn MessageStore>, config: &ViewerConfig) -> Self {
        Self {
            store,
            consumed: ConsumedRegistry::new(config.consumed_capacity),
            retries: VecDeque::new(),
            retry_capacity: config.write_retry_capacity.max(1),
        }
    }

    /// Validate an open/press attempt before anything renders.
    pub fn check_open(&mut self, key: &MessageKey) -> Result<OpenCheck> {
        self.flush_retries();
        if self.consumed.contains(key) {
            // The registry is authoritative during the propagation window;
            // re-request the durable write in case the first one was lost.
            self.request_expire(key);
            return Ok(OpenCheck::Consumed);
        }
        let message = self.store.get(key)?;
        if message.state.is_expired() {
            Ok(OpenCheck::Expired)
        } else {
            Ok(OpenCheck::Viewable(message))
        }
    }

    /// Consume the view: record the first-view timestamp (idempotent) and
    /// build the countdown from the stored end time, so remaining time is
    /// identical no matter how often the viewer has been closed and
    /// reopened.
    ///
    /// Must only be called once the media reference has resolved; a broken
    /// link must never burn the one allowed view.
    pub fn start_view(&mut self, message: &ProtectedMediaMessage, now: DateTime<Utc>) -> Countdown {
        let state = match message.state {
            ViewState::NotViewed => match self.store.mark_viewed(&message.key, now) {
                Ok(state) => state,
                Err(err) => {
                    warn!(key = %message.key, error = %err, "mark_viewed failed; continuing locally");
                    self.queue_retry(message.key, WriteOp::Viewed { at: now });
                    ViewState::viewing(now, &message.policy)
                }
            },
            state => state,
        };
        let mut countdown = Countdown {
            key: message.key,
            ends_at: state.ends_at(),
            last_emitted_secs: None,
            expire_requested: state.is_expired(),
        };
        // The caller displays this value immediately; ticks only emit once
        // the integer changes past it.
        countdown.last_emitted_secs = countdown.remaining_secs(now);
        countdown
    }

    /// Advance the countdown. Call on the poll cadence while a timed view
    /// is open.
    pub fn tick(&mut self, countdown: &mut Countdown, now: DateTime<Utc>) -> TickOutcome {
        self.flush_retries();
        if countdown.expire_requested {
            return TickOutcome::default();
        }
        let Some(remaining_ms) = countdown.remaining_ms(now) else {
            return TickOutcome::default();
        };
        let mut outcome = TickOutcome::default();
        let secs = remaining_ms.div_ceil(1000);
        if countdown.last_emitted_secs != Some(secs) {
            countdown.last_emitted_secs = Some(secs);
            outcome.remaining_secs = Some(secs);
        }
        if remaining_ms == 0 {
            countdown.expire_requested = true;
            self.request_expire(&countdown.key);
            outcome.expired = true;
        }
        outcome
    }

    /// Record a completed view-once hold/release cycle.
    pub fn note_consumed(&mut self, key: MessageKey) {
        self.consumed.insert(key);
    }

    /// Request the terminal store transition. Failures are queued for
    /// retry; callers keep their own local latch either way.
    pub fn request_expire(&mut self, key: &MessageKey) {
        if let Err(err) = self.store.mark_expired(key) {
            warn!(key = %key, error = %err, "mark_expired failed; queued for retry");
            self.queue_retry(*key, WriteOp::Expired);
        }
    }

    /// Safety-guard read: has the store record turned terminal?
    ///
    /// A read failure counts as "not expired" -- the local guards decide,
    /// and the next poll re-reads.
    pub fn store_expired(&self, key: &MessageKey) -> bool {
        match self.store.get(key) {
            Ok(message) => message.state.is_expired(),
            Err(err) => {
                debug!(key = %key, error = %err, "store read failed during guard check");
                false
            }
        }
    }

    /// Re-attempt queued store writes; failures stay queued.
    pub fn flush_retries(&mut self) {
        if self.retries.is_empty() {
            return;
        }
        let pending: Vec<PendingWrite> = self.retries.drain(..).collect();
        for write in pending {
            let result = match write.op {
                WriteOp::Viewed { at } => self.store.mark_viewed(&write.key, at).map(|_| ()),
                WriteOp::Expired => self.store.mark_expired(&write.key),
            };
            if result.is_err() {
                self.retries.push_back(write);
            }
        }
    }

    pub fn pending_writes(&self) -> usize {
        self.retries.len()
    }

    fn queue_retry(&mut self, key: MessageKey, op: WriteOp) {
        if self.retries.iter().any(|p| p.key == key && p.op == op) {
            return;
        }
        if self.retries.len() >= self.retry_capacity {
            if let Some(dropped) = self.retries.pop_front() {
                warn!(key = %dropped.key, "retry queue full; dropping oldest pending write");
            }
        }
        self.retries.push_back(PendingWrite { key, op });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{
        ConversationId, MediaKind, MediaRef, ProtectedMediaPolicy, ViewingMode,
    };
    use crate::store::{MemoryStore, MessageStore};
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn policy(timer_seconds: u32, mode: ViewingMode) -> ProtectedMediaPolicy {
        ProtectedMediaPolicy {
            timer_seconds,
            viewing_mode: mode,
            media_kind: MediaKind::Photo,
            media_location: MediaRef("media://test".into()),
        }
    }

    /// Store wrapper that fails writes while `failing` is set.
    struct FlakyStore {
        inner: MemoryStore,
        failing: AtomicBool,
    }

    impl FlakyStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                failing: AtomicBool::new(false),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn unavailable(op: &'static str) -> crate::error::StoreError {
            crate::error::StoreError::Unavailable {
                op,
                message: "injected failure".into(),
            }
        }
    }

    impl MessageStore for FlakyStore {
        fn get(&self, key: &MessageKey) -> Result<ProtectedMediaMessage, crate::error::StoreError> {
            self.inner.get(key)
        }

        fn mark_viewed(
            &self,
            key: &MessageKey,
            at: DateTime<Utc>,
        ) -> Result<ViewState, crate::error::StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Self::unavailable("mark_viewed"));
            }
            self.inner.mark_viewed(key, at)
        }

        fn mark_expired(&self, key: &MessageKey) -> Result<(), crate::error::StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Self::unavailable("mark_expired"));
            }
            self.inner.mark_expired(key)
        }
    }

    fn seeded(timer_seconds: u32) -> (Arc<MemoryStore>, MessageKey) {
        let store = Arc::new(MemoryStore::new());
        let key = store.insert(
            ConversationId::generate(),
            policy(timer_seconds, ViewingMode::Tap),
        );
        (store, key)
    }

    #[test]
    fn countdown_derives_from_stored_ends_at() {
        let (store, key) = seeded(10);
        let mut engine = ExpirationEngine::new(store.clone());
        let open = Utc::now();

        let message = store.get(&key).unwrap();
        let first = engine.start_view(&message, open);
        assert_eq!(first.ends_at(), Some(open + Duration::seconds(10)));

        // Reopen three seconds later: same end time, not a fresh 10s.
        let message = store.get(&key).unwrap();
        let second = engine.start_view(&message, open + Duration::seconds(3));
        assert_eq!(second.ends_at(), Some(open + Duration::seconds(10)));
        assert_eq!(
            second.remaining_ms(open + Duration::seconds(3)),
            Some(7000)
        );
    }

    #[test]
    fn ticks_coalesce_to_one_emission_per_second() {
        let (store, key) = seeded(5);
        let mut engine = ExpirationEngine::new(store.clone());
        let open = Utc::now();
        let message = store.get(&key).unwrap();
        let mut countdown = engine.start_view(&message, open);

        // The initial value (5) was handed out by start_view; ticks within
        // the same display second have nothing to emit.
        let first = engine.tick(&mut countdown, open);
        assert_eq!(first.remaining_secs, None);
        let same = engine.tick(&mut countdown, open + Duration::milliseconds(100));
        assert_eq!(same.remaining_secs, None);

        let next = engine.tick(&mut countdown, open + Duration::milliseconds(1100));
        assert_eq!(next.remaining_secs, Some(4));
    }

    #[test]
    fn expiry_fires_exactly_once() {
        let (store, key) = seeded(2);
        let mut engine = ExpirationEngine::new(store.clone());
        let open = Utc::now();
        let message = store.get(&key).unwrap();
        let mut countdown = engine.start_view(&message, open);

        let at_zero = engine.tick(&mut countdown, open + Duration::seconds(2));
        assert!(at_zero.expired);
        assert!(store.get(&key).unwrap().state.is_expired());

        // Polling overlap after the request: silent no-op.
        let after = engine.tick(&mut countdown, open + Duration::seconds(3));
        assert_eq!(after, TickOutcome::default());
        assert!(countdown.is_finished());
    }

    #[test]
    fn view_once_has_no_countdown_ticks() {
        let (store, key) = seeded(0);
        let mut engine = ExpirationEngine::new(store.clone());
        let open = Utc::now();
        let message = store.get(&key).unwrap();
        let mut countdown = engine.start_view(&message, open);

        assert_eq!(countdown.ends_at(), None);
        let outcome = engine.tick(&mut countdown, open + Duration::seconds(60));
        assert_eq!(outcome, TickOutcome::default());
    }

    #[test]
    fn consumed_registry_rejects_before_store_catches_up() {
        let (store, key) = seeded(0);
        let mut engine = ExpirationEngine::new(store.clone());
        engine.note_consumed(key);

        match engine.check_open(&key).unwrap() {
            OpenCheck::Consumed => {}
            other => panic!("expected Consumed, got {other:?}"),
        }
        // The defensive expire write landed.
        assert!(store.get(&key).unwrap().state.is_expired());
    }

    #[test]
    fn failed_expire_write_stays_local_then_retries() {
        let inner = MemoryStore::new();
        let key = inner.insert(ConversationId::generate(), policy(1, ViewingMode::Tap));
        let store = Arc::new(FlakyStore::new(inner));
        let mut engine = ExpirationEngine::new(store.clone());

        let open = Utc::now();
        let message = store.get(&key).unwrap();
        let mut countdown = engine.start_view(&message, open);

        store.set_failing(true);
        let outcome = engine.tick(&mut countdown, open + Duration::seconds(1));
        // Local latch is authoritative even though the write failed.
        assert!(outcome.expired);
        assert!(countdown.is_finished());
        assert!(!store.get(&key).unwrap().state.is_expired());
        assert_eq!(engine.pending_writes(), 1);

        store.set_failing(false);
        engine.flush_retries();
        assert_eq!(engine.pending_writes(), 0);
        assert!(store.get(&key).unwrap().state.is_expired());
    }

    #[test]
    fn failed_mark_viewed_keeps_local_countdown_and_retries() {
        let inner = MemoryStore::new();
        let key = inner.insert(ConversationId::generate(), policy(5, ViewingMode::Tap));
        let store = Arc::new(FlakyStore::new(inner));
        let mut engine = ExpirationEngine::new(store.clone());

        store.set_failing(true);
        let open = Utc::now();
        let message = store.get(&key).unwrap();
        let countdown = engine.start_view(&message, open);
        assert_eq!(countdown.ends_at(), Some(open + Duration::seconds(5)));
        assert_eq!(engine.pending_writes(), 1);

        store.set_failing(false);
        engine.flush_retries();
        // The retried write carries the original open time.
        let state = store.get(&key).unwrap().state;
        assert_eq!(state.viewed_at(), Some(open));
        assert_eq!(state.ends_at(), Some(open + Duration::seconds(5)));
    }
}
