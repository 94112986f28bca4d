use backend_domain::{RoomId, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::RoomNotFound(id) => AppError::RoomNotFound(id),
        }
    }
}
