use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use backend_application::commands::room_commands;
use backend_application::queries::room_queries;
use backend_application::AppState;
use backend_domain::{Room, RoomIdQuery, RoomPayload, RoomQuery};

use crate::error::HttpError;

pub async fn list_rooms(
    State(state): State<AppState>,
    query: Result<Query<RoomQuery>, QueryRejection>,
) -> Result<Json<Vec<Room>>, HttpError> {
    let Query(query) = query?;
    let rooms = room_queries::list_rooms(&state, query).await?;
    Ok(Json(rooms))
}

pub async fn create_room(
    State(state): State<AppState>,
    payload: Result<Json<RoomPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Room>), HttpError> {
    let Json(payload) = payload?;
    let room = room_commands::create_room(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn join_room(
    State(state): State<AppState>,
    payload: Result<Json<RoomPayload>, JsonRejection>,
) -> Result<Json<Room>, HttpError> {
    let Json(payload) = payload?;
    let room = room_commands::join_room(&state, payload).await?;
    Ok(Json(room))
}

pub async fn delete_room(
    State(state): State<AppState>,
    query: Result<Query<RoomIdQuery>, QueryRejection>,
) -> Result<StatusCode, HttpError> {
    let Query(query) = query?;
    room_commands::delete_room(&state, query.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
