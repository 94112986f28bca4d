use crate::{AppError, AppState};
use backend_domain::{Room, RoomId, RoomQuery};

/// All live rooms ordered by id, or the single room matching `query.id`.
pub async fn list_rooms(state: &AppState, query: RoomQuery) -> Result<Vec<Room>, AppError> {
    match query.id {
        Some(id) => Ok(state.rooms.get_room(id).await.into_iter().collect()),
        None => Ok(state.rooms.list_rooms().await),
    }
}

pub async fn get_room(state: &AppState, id: RoomId) -> Result<Room, AppError> {
    Ok(state.rooms.get_room(id).await?)
}
