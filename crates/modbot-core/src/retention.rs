//! In-memory index of messages awaiting automatic deletion.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::domain::{ChatId, MessageId, MessageRef};

/// A message observed by the bot and not yet confirmed deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedMessage {
    pub message: MessageRef,
    pub received_at: DateTime<Utc>,
}

/// Chat -> message -> receipt time.
///
/// State is process-local and lost on restart. The lock is only held for the
/// map operation itself, never across an await, so handlers and the reaper can
/// share one store from any task.
#[derive(Debug, Default)]
pub struct RetentionStore {
    chats: Mutex<HashMap<ChatId, HashMap<MessageId, DateTime<Utc>>>>,
}

impl RetentionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChatId, HashMap<MessageId, DateTime<Utc>>>> {
        // A panic elsewhere must not wedge retention for the rest of the process.
        self.chats.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or overwrite the receipt time of a message.
    pub fn record(&self, chat_id: ChatId, message_id: MessageId, received_at: DateTime<Utc>) {
        self.lock()
            .entry(chat_id)
            .or_default()
            .insert(message_id, received_at);
    }

    /// Drop a message that was deleted through another path. Returns whether it was tracked.
    pub fn forget(&self, msg: MessageRef) -> bool {
        let mut chats = self.lock();
        let Some(bucket) = chats.get_mut(&msg.chat_id) else {
            return false;
        };
        let removed = bucket.remove(&msg.message_id).is_some();
        if bucket.is_empty() {
            chats.remove(&msg.chat_id);
        }
        removed
    }

    /// Remove and return every entry strictly older than `max_age` at `now`.
    ///
    /// Output is ordered by chat, then message id. Entries stamped in the
    /// future relative to `now` are kept.
    pub fn sweep(&self, now: DateTime<Utc>, max_age: Duration) -> Vec<TrackedMessage> {
        let mut expired = Vec::new();
        let mut chats = self.lock();

        chats.retain(|&chat_id, bucket| {
            bucket.retain(|&message_id, &mut received_at| {
                if !is_expired(now, received_at, max_age) {
                    return true;
                }
                expired.push(TrackedMessage {
                    message: MessageRef::new(chat_id, message_id),
                    received_at,
                });
                false
            });
            !bucket.is_empty()
        });

        expired.sort_by_key(|t| t.message);
        expired
    }

    /// Number of tracked messages across all chats.
    pub fn len(&self) -> usize {
        self.lock().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn chat_count(&self) -> usize {
        self.lock().len()
    }
}

fn is_expired(now: DateTime<Utc>, received_at: DateTime<Utc>, max_age: Duration) -> bool {
    match now.signed_duration_since(received_at).to_std() {
        Ok(age) => age > max_age,
        Err(_) => false, // received_at is in the future
    }
}
