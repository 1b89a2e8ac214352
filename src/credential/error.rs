use thiserror::Error;

use crate::protocol::ErrorCode;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("a principal with that name already exists")]
    Exists,
    #[error("no principal with that name exists")]
    NotFound,
    #[error("password does not match")]
    WrongPassword,
    #[error("failed to reach the credential store: {0}")]
    Transport(String),
}

impl CredentialError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Exists => ErrorCode::GameExists,
            Self::NotFound | Self::WrongPassword => ErrorCode::WrongCredentials,
            Self::Transport(_) => ErrorCode::TransportFailed,
        }
    }
}
