//! Room-scoped live delivery.
//!
//! Every live room owns a lane: a `broadcast` sender behind an async mutex.
//! Holding the lane lock across "append to the log, then publish" is what
//! keeps publish order identical to append order within a room. Rooms never
//! share a lane, so a feed only ever sees traffic for the room it asked for.

use std::collections::HashMap;
use std::sync::Arc;

use backend_domain::{ChatMessage, RoomId};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::AppError;

pub const DEFAULT_FEED_CAPACITY: usize = 256;

type Lane = Arc<Mutex<broadcast::Sender<ChatMessage>>>;

pub struct BroadcastHub {
    lanes: RwLock<HashMap<RoomId, Lane>>,
    capacity: usize,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            lanes: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Registers the lane for a freshly created room. Idempotent.
    pub async fn open_room(&self, room_id: RoomId) {
        let mut lanes = self.lanes.write().await;
        lanes.entry(room_id).or_insert_with(|| {
            let (tx, _rx) = broadcast::channel(self.capacity);
            Arc::new(Mutex::new(tx))
        });
    }

    /// Drops the room's lane. Feeds on the room see end-of-stream once any
    /// in-flight publish has released its permit.
    pub async fn close_room(&self, room_id: RoomId) -> bool {
        let removed = self.lanes.write().await.remove(&room_id).is_some();
        if removed {
            debug!(room_id = %room_id, "room lane closed");
        }
        removed
    }

    pub async fn subscribe(&self, room_id: RoomId) -> Result<LiveFeed, AppError> {
        let lane = self.lane(room_id).await?;
        let receiver = lane.lock().await.subscribe();
        let feed = LiveFeed {
            id: Uuid::new_v4(),
            room_id,
            receiver: Some(receiver),
        };
        debug!(room_id = %room_id, feed_id = %feed.id, "feed subscribed");
        Ok(feed)
    }

    /// Takes the room's publish lane. Other senders to the same room wait
    /// until the permit is dropped; other rooms are unaffected.
    pub async fn reserve(&self, room_id: RoomId) -> Result<PublishPermit, AppError> {
        let lane = self.lane(room_id).await?;
        Ok(PublishPermit {
            room_id,
            sender: lane.lock_owned().await,
        })
    }

    /// Returns how many feeds received the message.
    pub async fn publish(&self, message: ChatMessage) -> Result<usize, AppError> {
        let permit = self.reserve(message.room_id).await?;
        Ok(permit.publish(message))
    }

    pub async fn subscriber_count(&self, room_id: RoomId) -> usize {
        match self.lane(room_id).await {
            Ok(lane) => lane.lock().await.receiver_count(),
            Err(_) => 0,
        }
    }

    pub async fn room_count(&self) -> usize {
        self.lanes.read().await.len()
    }

    async fn lane(&self, room_id: RoomId) -> Result<Lane, AppError> {
        self.lanes
            .read()
            .await
            .get(&room_id)
            .cloned()
            .ok_or(AppError::RoomNotFound(room_id))
    }
}

pub struct PublishPermit {
    room_id: RoomId,
    sender: OwnedMutexGuard<broadcast::Sender<ChatMessage>>,
}

impl PublishPermit {
    pub fn publish(&self, message: ChatMessage) -> usize {
        if message.room_id != self.room_id {
            warn!(
                lane = %self.room_id,
                room_id = %message.room_id,
                "refusing to publish message on another room's lane"
            );
            return 0;
        }
        // send only fails when nobody is listening
        self.sender.send(message).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Message(ChatMessage),
    /// The feed fell behind and `n` messages were dropped from its buffer.
    Lagged(u64),
}

/// One open subscription to a single room. Dropping it unsubscribes.
pub struct LiveFeed {
    id: Uuid,
    room_id: RoomId,
    receiver: Option<broadcast::Receiver<ChatMessage>>,
}

impl LiveFeed {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn is_closed(&self) -> bool {
        self.receiver.is_none()
    }

    /// Next event, or `None` once the feed is closed or its room is gone.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(message) if message.room_id == self.room_id => {
                    return Some(FeedEvent::Message(message));
                }
                Ok(message) => {
                    warn!(
                        feed_id = %self.id,
                        room_id = %self.room_id,
                        foreign_room = %message.room_id,
                        "dropping message for another room"
                    );
                }
                Err(RecvError::Lagged(skipped)) => return Some(FeedEvent::Lagged(skipped)),
                Err(RecvError::Closed) => {
                    debug!(feed_id = %self.id, room_id = %self.room_id, "feed ended");
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Unsubscribes. Safe to call more than once.
    pub fn close(&mut self) {
        if self.receiver.take().is_some() {
            debug!(feed_id = %self.id, room_id = %self.room_id, "feed closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn message(room: u64, seq: u64, body: &str) -> ChatMessage {
        ChatMessage {
            room_id: RoomId(room),
            seq,
            sender: "alice".to_string(),
            message: body.to_string(),
            timestamp: Utc::now(),
        }
    }

    async fn next_message(feed: &mut LiveFeed) -> ChatMessage {
        match timeout(Duration::from_secs(1), feed.recv()).await {
            Ok(Some(FeedEvent::Message(message))) => message,
            other => panic!("expected a message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscribe_unknown_room_is_not_found() {
        let hub = BroadcastHub::default();
        let err = hub.subscribe(RoomId(9)).await.err().expect("missing room");
        assert!(matches!(err, AppError::RoomNotFound(RoomId(9))));
    }

    #[tokio::test]
    async fn publish_reaches_only_feeds_of_the_same_room() {
        let hub = BroadcastHub::default();
        hub.open_room(RoomId(1)).await;
        hub.open_room(RoomId(2)).await;
        let mut first = hub.subscribe(RoomId(1)).await.expect("feed 1");
        let mut second = hub.subscribe(RoomId(2)).await.expect("feed 2");

        let delivered = hub.publish(message(1, 1, "hello")).await.expect("publish");
        assert_eq!(delivered, 1);
        assert_eq!(next_message(&mut first).await.message, "hello");
        assert!(timeout(Duration::from_millis(50), second.recv()).await.is_err());
    }

    #[tokio::test]
    async fn feed_opened_after_publish_gets_no_backlog() {
        let hub = BroadcastHub::default();
        hub.open_room(RoomId(1)).await;
        let _early = hub.subscribe(RoomId(1)).await.expect("early");
        hub.publish(message(1, 1, "before")).await.expect("publish");

        let mut late = hub.subscribe(RoomId(1)).await.expect("late");
        assert!(timeout(Duration::from_millis(50), late.recv()).await.is_err());
        hub.publish(message(1, 2, "after")).await.expect("publish");
        assert_eq!(next_message(&mut late).await.seq, 2);
    }

    #[tokio::test]
    async fn close_room_ends_open_feeds_and_rejects_new_ones() {
        let hub = BroadcastHub::default();
        hub.open_room(RoomId(3)).await;
        let mut feed = hub.subscribe(RoomId(3)).await.expect("feed");

        assert!(hub.close_room(RoomId(3)).await);
        assert!(!hub.close_room(RoomId(3)).await);
        assert_eq!(timeout(Duration::from_secs(1), feed.recv()).await.ok(), Some(None));
        assert!(feed.is_closed());
        assert!(hub.subscribe(RoomId(3)).await.is_err());
        assert!(hub.publish(message(3, 1, "late")).await.is_err());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_unsubscribes() {
        let hub = BroadcastHub::default();
        hub.open_room(RoomId(1)).await;
        let mut feed = hub.subscribe(RoomId(1)).await.expect("feed");
        assert_eq!(hub.subscriber_count(RoomId(1)).await, 1);

        feed.close();
        feed.close();
        assert_eq!(hub.subscriber_count(RoomId(1)).await, 0);
        assert!(feed.recv().await.is_none());
    }

    #[tokio::test]
    async fn permit_refuses_foreign_room_messages() {
        let hub = BroadcastHub::default();
        hub.open_room(RoomId(1)).await;
        let _feed = hub.subscribe(RoomId(1)).await.expect("feed");
        let permit = hub.reserve(RoomId(1)).await.expect("permit");
        assert_eq!(permit.publish(message(2, 1, "wrong lane")), 0);
    }

    #[tokio::test]
    async fn slow_feed_reports_lag() {
        let hub = BroadcastHub::new(2);
        hub.open_room(RoomId(1)).await;
        let mut feed = hub.subscribe(RoomId(1)).await.expect("feed");
        for seq in 1..=4 {
            hub.publish(message(1, seq, "burst")).await.expect("publish");
        }
        assert_eq!(feed.recv().await, Some(FeedEvent::Lagged(2)));
        assert_eq!(next_message(&mut feed).await.seq, 3);
    }

    #[tokio::test]
    async fn reserve_serializes_publishers_per_room() {
        let hub = Arc::new(BroadcastHub::default());
        hub.open_room(RoomId(1)).await;
        hub.open_room(RoomId(2)).await;

        let permit = hub.reserve(RoomId(1)).await.expect("permit");
        let blocked = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.reserve(RoomId(1)).await.map(|_| ()) })
        };
        // another room is independent
        let other = timeout(Duration::from_millis(100), hub.reserve(RoomId(2))).await;
        assert!(matches!(other, Ok(Ok(_))));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!blocked.is_finished());
        drop(permit);
        assert!(timeout(Duration::from_secs(1), blocked).await.is_ok());
    }
}
