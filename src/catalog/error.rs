use thiserror::Error;

use crate::protocol::ErrorCode;

use super::model::ConfigValidationError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no game named `{0}`")]
    NotFound(String),

    #[error("a game named `{0}` already exists")]
    Exists(String),

    #[error("`{0}` is not owned by this developer")]
    NotOwner(String),

    #[error("`{0}` is not active")]
    Inactive(String),

    #[error("invalid game configuration: {0}")]
    ConfigInvalid(ConfigValidationError),

    #[error("rating must be between 1 and 5")]
    RatingOutOfRange,

    #[error("player has not downloaded `{0}`")]
    NotDownloaded(String),

    #[error("invalid version string")]
    InvalidVersion,

    #[error("storage failure: {0}")]
    Io(String),
}

impl CatalogError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::GameNotFound,
            Self::Exists(_) => ErrorCode::GameExists,
            Self::NotOwner(_) => ErrorCode::NotOwner,
            Self::Inactive(_) => ErrorCode::Inactive,
            Self::ConfigInvalid(_) | Self::InvalidVersion => ErrorCode::ConfigInvalid,
            Self::RatingOutOfRange => ErrorCode::RatingOutOfRange,
            Self::NotDownloaded(_) => ErrorCode::NotDownloaded,
            Self::Io(_) => ErrorCode::IoFailed,
        }
    }
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}
