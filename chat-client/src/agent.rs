//! Per-room viewing session: loads history, follows the live feed and keeps
//! a duplicate-free timeline, reconnecting with backoff when the feed drops.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use backend_domain::{ChatMessage, RoomId};

use crate::api::ChatApi;
use crate::backoff::ReconnectPolicy;
use crate::error::ClientError;
use crate::feed::{FeedConnection, FeedFrame};
use crate::timeline::{Accepted, Timeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Loading,
    Live,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// One live message, appended to the timeline.
    Message(ChatMessage),
    /// Messages recovered from history after a seq gap.
    Reconciled(Vec<ChatMessage>),
    /// The feed was reopened; carries whatever was missed while it was down.
    Reconnected(Vec<ChatMessage>),
}

pub struct ClientSyncAgent {
    api: ChatApi,
    room_id: RoomId,
    display_name: String,
    policy: ReconnectPolicy,
    state: SyncState,
    timeline: Timeline,
    feed: Option<FeedConnection>,
}

impl ClientSyncAgent {
    pub fn new(api: ChatApi, room_id: RoomId, display_name: impl Into<String>) -> Self {
        Self {
            api,
            room_id,
            display_name: display_name.into(),
            policy: ReconnectPolicy::default(),
            state: SyncState::Idle,
            timeline: Timeline::new(),
            feed: None,
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.timeline.messages()
    }

    /// Loads the room's history and opens its live feed.
    ///
    /// The feed is opened after the first snapshot, then history is read once
    /// more so a message sent between the two calls is not lost.
    pub async fn enter(&mut self) -> Result<&[ChatMessage], ClientError> {
        match self.state {
            SyncState::Idle => {}
            SyncState::Live => return Ok(self.timeline.messages()),
            SyncState::Loading => {
                return Err(ClientError::InvalidInput("room is already loading".to_string()))
            }
            SyncState::Closed => return Err(ClientError::Closed),
        }

        self.state = SyncState::Loading;
        let snapshot = match self.api.history(self.room_id, None).await {
            Ok(snapshot) => snapshot,
            Err(err) => return Err(self.fail(err)),
        };
        self.timeline.replace(snapshot);

        let feed = match self.open_feed().await {
            Ok(feed) => feed,
            Err(err) => return Err(self.fail(err)),
        };
        self.feed = Some(feed);
        if let Err(err) = self.reconcile().await {
            return Err(self.fail(err));
        }

        self.state = SyncState::Live;
        info!(
            room_id = %self.room_id,
            messages = self.timeline.len(),
            "room view live"
        );
        Ok(self.timeline.messages())
    }

    /// Waits for the next change to the timeline.
    ///
    /// Duplicates are skipped silently. A dropped feed is reopened with
    /// backoff; if the room is gone the view closes and `RoomNotFound` is
    /// returned.
    pub async fn next_event(&mut self) -> Result<SyncEvent, ClientError> {
        loop {
            if self.state != SyncState::Live {
                return Err(ClientError::Closed);
            }
            let Some(feed) = self.feed.as_mut() else {
                return Err(ClientError::Closed);
            };

            match feed.next().await {
                FeedFrame::Message(message) => {
                    let seq = message.seq;
                    match self.timeline.accept(message.clone()) {
                        Accepted::Appended => return Ok(SyncEvent::Message(message)),
                        Accepted::Duplicate => {
                            debug!(room_id = %self.room_id, seq, "duplicate message dropped");
                        }
                        Accepted::Gap { expected, got } => {
                            warn!(room_id = %self.room_id, expected, got, "gap in live feed, reconciling");
                            match self.reconcile().await {
                                Ok(added) => return Ok(SyncEvent::Reconciled(added)),
                                Err(err) => return Err(self.fail(err)),
                            }
                        }
                    }
                }
                FeedFrame::Ended {
                    resubscribe,
                    reason,
                } => {
                    debug!(room_id = %self.room_id, resubscribe, reason = %reason, "live feed ended");
                    return self.reconnect().await;
                }
                FeedFrame::Failed(reason) => {
                    warn!(room_id = %self.room_id, "live feed failed: {}", reason);
                    return self.reconnect().await;
                }
            }
        }
    }

    /// Posts a message as this view's display name. Nothing is added to the
    /// timeline here; the message shows up when the feed delivers it.
    pub async fn send(&self, body: &str) -> Result<ChatMessage, ClientError> {
        if self.state == SyncState::Closed {
            return Err(ClientError::Closed);
        }
        self.api.send(self.room_id, &self.display_name, body).await
    }

    /// Like `send`, retrying transport failures up to `attempts` times.
    pub async fn send_with_retry(&self, body: &str, attempts: u32) -> Result<ChatMessage, ClientError> {
        let mut attempt = 0;
        loop {
            match self.send(body).await {
                Err(err) if err.is_transient() && attempt + 1 < attempts => {
                    let delay = self.policy.delay(attempt).unwrap_or(self.policy.max_delay);
                    warn!(room_id = %self.room_id, attempt, "send failed, retrying: {}", err);
                    sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Closes the live feed. The view accepts nothing afterwards.
    pub fn leave(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.close();
        }
        if self.state != SyncState::Closed {
            info!(room_id = %self.room_id, "room view closed");
        }
        self.state = SyncState::Closed;
    }

    async fn open_feed(&self) -> Result<FeedConnection, ClientError> {
        FeedConnection::connect(&self.api.feed_url(self.room_id), self.room_id).await
    }

    async fn reconcile(&mut self) -> Result<Vec<ChatMessage>, ClientError> {
        let snapshot = self.api.history(self.room_id, None).await?;
        let added = self.timeline.merge(snapshot);
        if !added.is_empty() {
            debug!(room_id = %self.room_id, added = added.len(), "timeline reconciled");
        }
        Ok(added)
    }

    /// Reopens the feed and reads history to catch up. Transient failures of
    /// either step share one backoff budget.
    async fn reconnect(&mut self) -> Result<SyncEvent, ClientError> {
        if let Some(mut feed) = self.feed.take() {
            feed.close();
        }
        let mut attempt = 0;
        loop {
            let Some(delay) = self.policy.delay(attempt) else {
                warn!(room_id = %self.room_id, attempt, "giving up on live feed");
                self.leave();
                return Err(ClientError::Transport(
                    "live feed reconnect attempts exhausted".to_string(),
                ));
            };
            // the first retry follows a clean server close, skip the wait
            if attempt > 0 {
                sleep(delay).await;
            }

            // a reopened feed is kept while the catch-up read is retried
            if self.feed.is_none() {
                match self.open_feed().await {
                    Ok(feed) => self.feed = Some(feed),
                    Err(err) if err.is_transient() => {
                        debug!(room_id = %self.room_id, attempt, "reconnect failed: {}", err);
                        attempt += 1;
                        continue;
                    }
                    Err(err) => return Err(self.fail(err)),
                }
            }

            match self.reconcile().await {
                Ok(added) => {
                    info!(room_id = %self.room_id, attempt, "live feed reconnected");
                    return Ok(SyncEvent::Reconnected(added));
                }
                Err(err) if err.is_transient() => {
                    debug!(room_id = %self.room_id, attempt, "catch-up after reconnect failed: {}", err);
                    attempt += 1;
                }
                Err(err) => return Err(self.fail(err)),
            }
        }
    }

    /// Closes the view on a non-transient failure. A transient failure while
    /// loading puts the view back to `Idle` so `enter` can be retried.
    fn fail(&mut self, err: ClientError) -> ClientError {
        if !err.is_transient() {
            self.leave();
        } else if self.state == SyncState::Loading {
            if let Some(mut feed) = self.feed.take() {
                feed.close();
            }
            self.state = SyncState::Idle;
        }
        err
    }
}
