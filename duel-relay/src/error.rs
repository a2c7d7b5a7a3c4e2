use duel_types::RoomId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("room {room_id} already has two players")]
    RoomFull { room_id: RoomId },
    #[error("connection has not joined a room")]
    NotInRoom,
    #[error("connection already joined room {room_id}")]
    AlreadyJoined { room_id: RoomId },
    #[error("connection not found")]
    ConnectionNotFound,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("rate limit exceeded")]
    RateLimited,
}
