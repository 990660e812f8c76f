//! Bounded store of per-message state

use crate::state_machine::{Effect, MessageId, MessageState, TransitionResult};
use chrono::{DateTime, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_STORE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(n) => n,
    None => panic!("capacity must be non-zero"),
};

pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(60 * 60);

struct Entry {
    state: MessageState,
    tracked_since: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    touched: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.touched) >= ttl
    }
}

/// Snapshot of a tracked message
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedMessage {
    pub state: MessageState,
    pub tracked_since: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Message states keyed by message id.
///
/// Least recently used entries are evicted at capacity, and entries not
/// updated within the TTL read as absent. Each `apply` runs under the store
/// lock, which makes a transition atomic with respect to other notifications
/// for the same message.
pub struct MessageStore {
    entries: Mutex<LruCache<MessageId, Entry>>,
    ttl: Duration,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_CAPACITY, DEFAULT_STATE_TTL)
    }
}

impl MessageStore {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<MessageId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `transition` against the current state and store its result.
    ///
    /// Nothing is written when `transition` returns an error.
    pub fn apply<F, E>(
        &self,
        message_id: &MessageId,
        transition: F,
    ) -> Result<(MessageState, Vec<Effect>), E>
    where
        F: FnOnce(Option<&MessageState>) -> Result<TransitionResult, E>,
    {
        let mut entries = self.lock();
        let now = Instant::now();

        if entries
            .peek(message_id)
            .is_some_and(|entry| entry.is_expired(now, self.ttl))
        {
            entries.pop(message_id);
            tracing::debug!(message_id = %message_id, "Message state expired");
        }

        let result = transition(entries.get(message_id).map(|entry| &entry.state))?;

        let updated_at = Utc::now();
        let tracked_since = entries
            .peek(message_id)
            .map_or(updated_at, |entry| entry.tracked_since);
        let evicted = entries.push(
            message_id.clone(),
            Entry {
                state: result.new_state.clone(),
                tracked_since,
                updated_at,
                touched: now,
            },
        );
        if let Some((evicted_id, _)) = evicted.filter(|(id, _)| id != message_id) {
            tracing::debug!(message_id = %evicted_id, "Evicted least recently used message state");
        }

        Ok((result.new_state, result.effects))
    }

    /// Look up a message without refreshing its recency
    pub fn get(&self, message_id: &MessageId) -> Option<TrackedMessage> {
        let entries = self.lock();
        entries
            .peek(message_id)
            .filter(|entry| !entry.is_expired(Instant::now(), self.ttl))
            .map(|entry| TrackedMessage {
                state: entry.state.clone(),
                tracked_since: entry.tracked_since,
                updated_at: entry.updated_at,
            })
    }

    /// Number of entries held, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let now = Instant::now();
        let expired: Vec<MessageId> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, self.ttl))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            entries.pop(id);
        }
        expired.len()
    }
}
