use async_trait::async_trait;

use crate::entities::{ChatMessage, Room};
use crate::error::StoreError;
use crate::value_objects::RoomId;

/// Owns the set of live rooms and their participant lists.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Reserves a fresh id. The room stays invisible until `insert_room`.
    async fn allocate_id(&self) -> RoomId;
    async fn insert_room(&self, room: Room) -> Room;
    async fn list_rooms(&self) -> Vec<Room>;
    async fn get_room(&self, id: RoomId) -> Result<Room, StoreError>;
    async fn add_participant(&self, id: RoomId, name: &str) -> Result<Room, StoreError>;
    /// Adds `name` only when it is not already listed.
    async fn ensure_participant(&self, id: RoomId, name: &str) -> Result<(), StoreError>;
    async fn delete_room(&self, id: RoomId) -> Result<Room, StoreError>;
    async fn contains(&self, id: RoomId) -> bool;
}

/// Append-only per-room message log.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn open_log(&self, room_id: RoomId);
    async fn append(
        &self,
        room_id: RoomId,
        sender: String,
        message: String,
    ) -> Result<ChatMessage, StoreError>;
    /// Messages in append order; `limit` keeps only the newest entries.
    async fn snapshot(
        &self,
        room_id: RoomId,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, StoreError>;
    /// Returns whether a log existed for the room.
    async fn purge(&self, room_id: RoomId) -> bool;
}
