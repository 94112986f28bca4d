use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use backend_domain::{ChatMessage, MessageRepository, RoomId, StoreError};

use crate::utils::monotonic_timestamp;

#[derive(Default)]
struct RoomLog {
    entries: VecDeque<ChatMessage>,
    next_seq: u64,
    last_timestamp: Option<DateTime<Utc>>,
    evicted: u64,
}

/// Bounded in-memory message log, one independently locked log per room.
pub struct InMemoryMessageStore {
    logs: RwLock<HashMap<RoomId, Arc<Mutex<RoomLog>>>>,
    history_limit: usize,
}

impl InMemoryMessageStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            logs: RwLock::new(HashMap::new()),
            history_limit: history_limit.max(1),
        }
    }

    async fn log(&self, room_id: RoomId) -> Result<Arc<Mutex<RoomLog>>, StoreError> {
        self.logs
            .read()
            .await
            .get(&room_id)
            .cloned()
            .ok_or(StoreError::RoomNotFound(room_id))
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageStore {
    async fn open_log(&self, room_id: RoomId) {
        let mut logs = self.logs.write().await;
        logs.entry(room_id).or_insert_with(|| {
            Arc::new(Mutex::new(RoomLog {
                next_seq: 1,
                ..RoomLog::default()
            }))
        });
    }

    async fn append(
        &self,
        room_id: RoomId,
        sender: String,
        message: String,
    ) -> Result<ChatMessage, StoreError> {
        let log = self.log(room_id).await?;
        let mut log = log.lock().await;

        // stamped under the room lock so timestamps follow append order
        let timestamp = monotonic_timestamp(log.last_timestamp, Utc::now());
        let entry = ChatMessage {
            room_id,
            seq: log.next_seq,
            sender,
            message,
            timestamp,
        };
        log.next_seq += 1;
        log.last_timestamp = Some(timestamp);

        if log.entries.len() >= self.history_limit {
            log.entries.pop_front();
            log.evicted += 1;
            if log.evicted % 1000 == 1 {
                debug!(room_id = %room_id, evicted = log.evicted, "evicting oldest messages");
            }
        }
        log.entries.push_back(entry.clone());
        Ok(entry)
    }

    async fn snapshot(
        &self,
        room_id: RoomId,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let log = self.log(room_id).await?;
        let log = log.lock().await;
        let skip = match limit {
            Some(limit) => log.entries.len().saturating_sub(limit),
            None => 0,
        };
        Ok(log.entries.iter().skip(skip).cloned().collect())
    }

    async fn purge(&self, room_id: RoomId) -> bool {
        self.logs.write().await.remove(&room_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_room(limit: usize) -> InMemoryMessageStore {
        let store = InMemoryMessageStore::new(limit);
        store.open_log(RoomId(1)).await;
        store
    }

    #[tokio::test]
    async fn empty_room_has_empty_snapshot() {
        let store = store_with_room(10).await;
        assert!(store.snapshot(RoomId(1), None).await.expect("snapshot").is_empty());
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let store = InMemoryMessageStore::new(10);
        let err = store
            .append(RoomId(2), "alice".into(), "hi".into())
            .await
            .expect_err("no log");
        assert_eq!(err, StoreError::RoomNotFound(RoomId(2)));
        assert!(store.snapshot(RoomId(2), None).await.is_err());
    }

    #[tokio::test]
    async fn append_assigns_sequence_and_ordered_timestamps() {
        let store = store_with_room(10).await;
        let first = store.append(RoomId(1), "alice".into(), "one".into()).await.expect("one");
        let second = store.append(RoomId(1), "bob".into(), "two".into()).await.expect("two");

        assert_eq!((first.seq, second.seq), (1, 2));
        assert!(first.timestamp <= second.timestamp);
        let snapshot = store.snapshot(RoomId(1), None).await.expect("snapshot");
        assert_eq!(snapshot, vec![first, second]);
    }

    #[tokio::test]
    async fn bounded_log_evicts_oldest_but_keeps_counting() {
        let store = store_with_room(3).await;
        for n in 0..5 {
            store
                .append(RoomId(1), "alice".into(), format!("m{n}"))
                .await
                .expect("append");
        }
        let snapshot = store.snapshot(RoomId(1), None).await.expect("snapshot");
        let seqs: Vec<u64> = snapshot.iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn limit_returns_newest_in_append_order() {
        let store = store_with_room(10).await;
        for n in 0..4 {
            store
                .append(RoomId(1), "alice".into(), format!("m{n}"))
                .await
                .expect("append");
        }
        let tail = store.snapshot(RoomId(1), Some(2)).await.expect("snapshot");
        let bodies: Vec<&str> = tail.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, vec!["m2", "m3"]);
    }

    #[tokio::test]
    async fn purge_makes_room_unreachable() {
        let store = store_with_room(10).await;
        store.append(RoomId(1), "alice".into(), "hi".into()).await.expect("append");

        assert!(store.purge(RoomId(1)).await);
        assert!(!store.purge(RoomId(1)).await);
        assert!(store.snapshot(RoomId(1), None).await.is_err());
        assert!(store.append(RoomId(1), "alice".into(), "again".into()).await.is_err());
    }

    #[tokio::test]
    async fn rooms_keep_separate_sequences() {
        let store = store_with_room(10).await;
        store.open_log(RoomId(2)).await;
        store.append(RoomId(1), "alice".into(), "a".into()).await.expect("a");
        let other = store.append(RoomId(2), "bob".into(), "b".into()).await.expect("b");
        assert_eq!(other.seq, 1);
        assert_eq!(store.snapshot(RoomId(1), None).await.expect("room 1").len(), 1);
    }
}
