use thiserror::Error;

use crate::RoomId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
}
