use tracing::info;

use crate::{AppError, AppState};
use backend_domain::{Room, RoomId, RoomPayload};

/// Opens the room's log and lane before the room becomes visible, so a listed
/// room always has history and a deleted one never gets them back.
pub async fn create_room(state: &AppState, payload: RoomPayload) -> Result<Room, AppError> {
    let participants = normalize_participants(payload.participants);
    let id = state.rooms.allocate_id().await;
    state.messages.open_log(id).await;
    state.hub.open_room(id).await;
    let room = state.rooms.insert_room(Room::new(id, participants)).await;
    state.metrics.record_room_created();
    info!(
        room_id = %room.id,
        participants = room.participants.len(),
        "room created"
    );
    Ok(room)
}

/// Appends the first listed participant to an existing room.
pub async fn join_room(state: &AppState, payload: RoomPayload) -> Result<Room, AppError> {
    let id = payload
        .id
        .ok_or_else(|| AppError::InvalidInput("id is required".to_string()))?;
    let name = payload
        .participants
        .into_iter()
        .find_map(|name| normalize_name(&name))
        .ok_or_else(|| AppError::InvalidInput("participants must name someone".to_string()))?;
    let room = state.rooms.add_participant(id, &name).await?;
    info!(room_id = %id, participant = %name, "participant joined");
    Ok(room)
}

/// Removes the room, ends every feed watching it and purges its log.
pub async fn delete_room(state: &AppState, id: RoomId) -> Result<(), AppError> {
    state.rooms.delete_room(id).await?;
    let had_lane = state.hub.close_room(id).await;
    let had_log = state.messages.purge(id).await;
    state.metrics.record_room_deleted();
    info!(room_id = %id, had_lane, had_log, "room deleted");
    Ok(())
}

fn normalize_participants(values: Vec<String>) -> Vec<String> {
    values
        .iter()
        .filter_map(|value| normalize_name(value))
        .collect()
}

fn normalize_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
