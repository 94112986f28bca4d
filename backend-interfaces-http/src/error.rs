use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<backend_application::AppError> for HttpError {
    fn from(value: backend_application::AppError) -> Self {
        match value {
            err @ backend_application::AppError::RoomNotFound(_) => HttpError::NotFound(err.to_string()),
            backend_application::AppError::InvalidInput(msg) => HttpError::BadRequest(msg),
            backend_application::AppError::Internal(err) => HttpError::Internal(err.to_string()),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for HttpError {
    fn from(value: axum::extract::rejection::JsonRejection) -> Self {
        HttpError::BadRequest(value.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for HttpError {
    fn from(value: axum::extract::rejection::QueryRejection) -> Self {
        HttpError::BadRequest(value.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, format!("bad request: {}", msg)),
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
