//! Process-wide ownership store.
//!
//! The single shared mutable resource in the broker. Records are read out as
//! copies and every mutation happens under the store lock; callers that need
//! a whole flow serialized per conversation (the respond pipeline) hold the
//! per-conversation async guard for its duration. No business logic lives
//! here.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

use ombud_core::unix_timestamp_ms;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Who currently owns a conversation.
pub enum OwnershipState {
    WithAutomation,
    WithHuman,
}

impl OwnershipState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WithAutomation => "with_automation",
            Self::WithHuman => "with_human",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Cached ownership view of one conversation.
pub struct OwnershipRecord {
    pub state: OwnershipState,
    /// Opaque generative-session handle; present only while automation has
    /// produced at least one reply, cleared on every hand-off to a human.
    pub session_handle: Option<String>,
}

impl Default for OwnershipRecord {
    fn default() -> Self {
        Self {
            state: OwnershipState::WithAutomation,
            session_handle: None,
        }
    }
}

struct RecordEntry {
    record: OwnershipRecord,
    updated_unix_ms: u64,
}

impl RecordEntry {
    fn new() -> Self {
        Self {
            record: OwnershipRecord::default(),
            updated_unix_ms: unix_timestamp_ms(),
        }
    }
}

#[derive(Default)]
struct StoreInner {
    records: HashMap<String, RecordEntry>,
    /// Guards are keyed separately and never removed, so a reopen that drops
    /// the record cannot hand two in-flight tasks different locks for the
    /// same conversation id.
    guards: HashMap<String, Arc<AsyncMutex<()>>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// Debug-endpoint view of one tracked conversation.
pub struct OwnershipSnapshotEntry {
    pub state: OwnershipState,
    pub has_session_handle: bool,
    pub updated_unix_ms: u64,
}

#[derive(Default)]
/// Mapping from conversation id to ownership record, created lazily on first
/// access and owned exclusively by this store.
pub struct OwnershipStore {
    inner: Mutex<StoreInner>,
}

impl OwnershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the conversation's record, creating the default
    /// (`WithAutomation`, no handle) entry if none exists yet.
    pub fn record(&self, conversation_id: &str) -> OwnershipRecord {
        let mut inner = self.lock_inner();
        inner
            .records
            .entry(conversation_id.to_string())
            .or_insert_with(RecordEntry::new)
            .record
            .clone()
    }

    pub fn set_state(&self, conversation_id: &str, state: OwnershipState) {
        let mut inner = self.lock_inner();
        let entry = inner
            .records
            .entry(conversation_id.to_string())
            .or_insert_with(RecordEntry::new);
        entry.record.state = state;
        entry.updated_unix_ms = unix_timestamp_ms();
    }

    pub fn set_session_handle(&self, conversation_id: &str, handle: Option<String>) {
        let mut inner = self.lock_inner();
        let entry = inner
            .records
            .entry(conversation_id.to_string())
            .or_insert_with(RecordEntry::new);
        entry.record.session_handle = handle;
        entry.updated_unix_ms = unix_timestamp_ms();
    }

    pub fn contains(&self, conversation_id: &str) -> bool {
        self.lock_inner().records.contains_key(conversation_id)
    }

    pub fn remove(&self, conversation_id: &str) {
        self.lock_inner().records.remove(conversation_id);
    }

    /// Per-conversation guard serializing multi-step flows.
    pub fn conversation_guard(&self, conversation_id: &str) -> Arc<AsyncMutex<()>> {
        let mut inner = self.lock_inner();
        Arc::clone(
            inner
                .guards
                .entry(conversation_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    pub fn tracked_count(&self) -> usize {
        self.lock_inner().records.len()
    }

    pub fn snapshot(&self) -> BTreeMap<String, OwnershipSnapshotEntry> {
        self.lock_inner()
            .records
            .iter()
            .map(|(conversation_id, entry)| {
                (
                    conversation_id.clone(),
                    OwnershipSnapshotEntry {
                        state: entry.record.state,
                        has_session_handle: entry.record.session_handle.is_some(),
                        updated_unix_ms: entry.updated_unix_ms,
                    },
                )
            })
            .collect()
    }

    fn lock_inner(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().expect("ownership store lock poisoned")
    }
}
