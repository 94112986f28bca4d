// Room entity

use serde::{Deserialize, Serialize};

use crate::value_objects::RoomId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Insertion order is preserved and duplicates are kept.
    pub participants: Vec<String>,
}

impl Room {
    pub fn new(id: RoomId, participants: Vec<String>) -> Self {
        Self { id, participants }
    }

    pub fn has_participant(&self, name: &str) -> bool {
        self.participants.iter().any(|item| item == name)
    }
}

/// Body of `POST /room` and `PUT /room`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RoomId>,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomQuery {
    pub id: Option<RoomId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomIdQuery {
    pub id: RoomId,
}
