//! In-memory reference store.
//!
//! Stands in for the host's message table in tests and in the CLI harness.
//! Write semantics match the contract exactly: `mark_viewed` is write-once,
//! `mark_expired` is one-way.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::message::{
    ConversationId, MessageId, MessageKey, ProtectedMediaMessage, ProtectedMediaPolicy, ViewState,
};
use crate::store::MessageStore;

#[derive(Debug, Clone)]
struct Record {
    policy: ProtectedMediaPolicy,
    state: ViewState,
}

/// Thread-safe in-memory message table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<MessageKey, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh protected message and return its key.
    pub fn insert(&self, conversation: ConversationId, policy: ProtectedMediaPolicy) -> MessageKey {
        let key = MessageKey {
            conversation,
            message: MessageId::generate(),
        };
        self.records.lock().unwrap().insert(
            key,
            Record {
                policy,
                state: ViewState::NotViewed,
            },
        );
        key
    }

    /// Seed a record in an arbitrary state (test setup).
    pub fn insert_with_state(
        &self,
        key: MessageKey,
        policy: ProtectedMediaPolicy,
        state: ViewState,
    ) {
        self.records.lock().unwrap().insert(key, Record { policy, state });
    }

    /// Drop a terminal record. The store may garbage-collect expired
    /// messages at the host's discretion; viewers must already have closed.
    pub fn remove(&self, key: &MessageKey) {
        self.records.lock().unwrap().remove(key);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

impl MessageStore for MemoryStore {
    fn get(&self, key: &MessageKey) -> Result<ProtectedMediaMessage, StoreError> {
        let records = self.records.lock().unwrap();
        let record = records
            .get(key)
            .ok_or(StoreError::NotFound { key: *key })?;
        Ok(ProtectedMediaMessage {
            key: *key,
            policy: record.policy.clone(),
            state: record.state,
        })
    }

    fn mark_viewed(&self, key: &MessageKey, at: DateTime<Utc>) -> Result<ViewState, StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(key)
            .ok_or(StoreError::NotFound { key: *key })?;
        if let ViewState::NotViewed = record.state {
            record.state = ViewState::viewing(at, &record.policy);
        }
        Ok(record.state)
    }

    fn mark_expired(&self, key: &MessageKey) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(key)
            .ok_or(StoreError::NotFound { key: *key })?;
        record.state = ViewState::Expired;
        Ok(())
    }
}
