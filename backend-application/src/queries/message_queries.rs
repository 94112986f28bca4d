use crate::{AppError, AppState};
use backend_domain::{ChatMessage, RoomId};

/// Snapshot of a room's log in append order. `limit` keeps the newest entries.
pub async fn get_history(
    state: &AppState,
    room_id: RoomId,
    limit: Option<usize>,
) -> Result<Vec<ChatMessage>, AppError> {
    let limit = limit.map(|value| value.clamp(1, state.config.history_limit.max(1)));
    let messages = state.messages.snapshot(room_id, limit).await?;
    Ok(messages)
}
