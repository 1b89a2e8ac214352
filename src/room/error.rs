use thiserror::Error;

use crate::protocol::ErrorCode;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("game `{0}` not found or inactive")]
    GameUnavailable(String),

    #[error("room `{0}` not found")]
    NotFound(String),

    #[error("player is not a member of this room")]
    NotMember,

    #[error("room is full")]
    Full,

    #[error("room is not in the required state")]
    WrongState,

    #[error("client version does not match the room's game version")]
    VersionMismatch,

    #[error("only the host may perform this action")]
    NotHost,

    #[error("at least two players are required to start")]
    InsufficientPlayers,

    #[error("failed to launch game server: {0}")]
    SpawnFailed(String),
}

impl RoomError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::GameUnavailable(_) => ErrorCode::GameNotFound,
            Self::NotFound(_) => ErrorCode::RoomNotFound,
            Self::NotMember => ErrorCode::NotMember,
            Self::Full => ErrorCode::RoomFull,
            Self::WrongState => ErrorCode::WrongState,
            Self::VersionMismatch => ErrorCode::VersionMismatch,
            Self::NotHost => ErrorCode::NotHost,
            Self::InsufficientPlayers => ErrorCode::InsufficientPlayers,
            Self::SpawnFailed(_) => ErrorCode::SpawnFailed,
        }
    }
}
