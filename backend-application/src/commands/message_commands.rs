use tracing::{debug, warn};

use crate::{AppError, AppState};
use backend_domain::{ChatMessage, NewMessage};

/// Validates, appends and publishes one message.
///
/// The room lane is held from before the append until after the publish, so
/// feeds observe messages in the same order as the log and never see a
/// message that a subsequent history read would miss.
pub async fn send_message(state: &AppState, payload: NewMessage) -> Result<ChatMessage, AppError> {
    match append_and_publish(state, payload).await {
        Ok(message) => Ok(message),
        Err(err) => {
            state.metrics.record_message_rejected();
            Err(err)
        }
    }
}

async fn append_and_publish(state: &AppState, payload: NewMessage) -> Result<ChatMessage, AppError> {
    let sender = normalize_required_text(&payload.sender, "sender")?;
    let body = validate_body(payload.message, state.config.max_message_len)?;
    let room_id = payload.room_id;
    if !state.rooms.contains(room_id).await {
        return Err(AppError::RoomNotFound(room_id));
    }

    let permit = state.hub.reserve(room_id).await?;
    let message = state.messages.append(room_id, sender, body).await?;
    let delivered = permit.publish(message.clone());
    drop(permit);

    state.metrics.record_message(delivered);
    debug!(
        room_id = %room_id,
        seq = message.seq,
        delivered,
        "message published"
    );

    if let Err(err) = state.rooms.ensure_participant(room_id, &message.sender).await {
        // the room was deleted right after the append; the log is already purged
        warn!(room_id = %room_id, "participant not recorded: {}", err);
    }
    Ok(message)
}

fn normalize_required_text(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn validate_body(body: String, max_len: usize) -> Result<String, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::InvalidInput("message must not be empty".to_string()));
    }
    let len = body.chars().count();
    if len > max_len {
        return Err(AppError::InvalidInput(format!(
            "message is {} characters, limit is {}",
            len, max_len
        )));
    }
    Ok(body)
}
