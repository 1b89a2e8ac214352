use thiserror::Error;

use crate::protocol::ErrorCode;

#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("player already has an active session")]
    AlreadyOnline,

    #[error("player is not logged in")]
    NotLoggedIn,
}

impl PresenceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AlreadyOnline => ErrorCode::AlreadyOnline,
            Self::NotLoggedIn => ErrorCode::NotLoggedIn,
        }
    }
}
