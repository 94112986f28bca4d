use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;

use backend_application::commands::message_commands;
use backend_application::queries::message_queries;
use backend_application::AppState;
use backend_domain::{ChatMessage, HistoryQuery, NewMessage};

use crate::error::HttpError;

pub async fn get_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<ChatMessage>>, HttpError> {
    let Query(query) = query?;
    let messages = message_queries::get_history(&state, query.room_id, query.limit).await?;
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<NewMessage>, JsonRejection>,
) -> Result<(StatusCode, Json<ChatMessage>), HttpError> {
    let Json(payload) = payload.map_err(|err| {
        warn!("rejected send payload: {}", err.body_text());
        HttpError::from(err)
    })?;
    let message = message_commands::send_message(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
