// Message entity
// Immutable once appended; removed only together with its room

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::RoomId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub room_id: RoomId,
    /// Per-room sequence number, starting at 1 and increasing by one per append.
    pub seq: u64,
    pub sender: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /chat/send`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMessage {
    pub sender: String,
    pub message: String,
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub room_id: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedQuery {
    pub room_id: RoomId,
}
