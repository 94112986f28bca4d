use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use backend_domain::{Room, RoomId, RoomRepository, StoreError};

pub struct InMemoryRoomRegistry {
    next_id: AtomicU64,
    rooms: RwLock<BTreeMap<RoomId, Room>>,
}

impl InMemoryRoomRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            rooms: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRegistry {
    async fn allocate_id(&self) -> RoomId {
        RoomId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn insert_room(&self, room: Room) -> Room {
        self.rooms.write().await.insert(room.id, room.clone());
        room
    }

    async fn list_rooms(&self) -> Vec<Room> {
        self.rooms.read().await.values().cloned().collect()
    }

    async fn get_room(&self, id: RoomId) -> Result<Room, StoreError> {
        self.rooms
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::RoomNotFound(id))
    }

    async fn add_participant(&self, id: RoomId, name: &str) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&id).ok_or(StoreError::RoomNotFound(id))?;
        room.participants.push(name.to_string());
        Ok(room.clone())
    }

    async fn ensure_participant(&self, id: RoomId, name: &str) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&id).ok_or(StoreError::RoomNotFound(id))?;
        if !room.has_participant(name) {
            room.participants.push(name.to_string());
        }
        Ok(())
    }

    async fn delete_room(&self, id: RoomId) -> Result<Room, StoreError> {
        self.rooms
            .write()
            .await
            .remove(&id)
            .ok_or(StoreError::RoomNotFound(id))
    }

    async fn contains(&self, id: RoomId) -> bool {
        self.rooms.read().await.contains_key(&id)
    }
}
