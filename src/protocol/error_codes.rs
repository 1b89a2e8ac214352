use serde::{Deserialize, Serialize};

/// Closed taxonomy of error conditions surfaced on the wire as
/// `{"status":"error","message":...}`. One variant per leaf of spec §7.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Protocol
    MalformedFrame,
    WrongRole,
    UnknownAction,
    TransportClosed,

    // Auth
    MissingCredentials,
    WrongCredentials,
    NotLoggedIn,
    AlreadyOnline,

    // Catalog
    GameNotFound,
    NotOwner,
    GameExists,
    Inactive,
    ConfigInvalid,

    // Review
    NotDownloaded,
    RatingOutOfRange,

    // Room
    RoomNotFound,
    NotMember,
    RoomFull,
    WrongState,
    VersionMismatch,
    NotHost,
    InsufficientPlayers,

    // Resource
    SpawnFailed,
    TransportFailed,
    IoFailed,
}

impl ErrorCode {
    /// Human-readable default message for this code, used when a component
    /// error doesn't already carry a more specific one.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MalformedFrame => "The frame could not be parsed.",
            Self::WrongRole => "This action does not belong to this connection's role.",
            Self::UnknownAction => "Unrecognized action name.",
            Self::TransportClosed => "The connection was closed.",
            Self::MissingCredentials => "Username and password are required.",
            Self::WrongCredentials => "Username or password is incorrect.",
            Self::NotLoggedIn => "This action requires an authenticated session.",
            Self::AlreadyOnline => "This player already has an active session.",
            Self::GameNotFound => "No game with that name exists.",
            Self::NotOwner => "Only the owning developer may perform this action.",
            Self::GameExists => "A game with that name already exists.",
            Self::Inactive => "This game is no longer active.",
            Self::ConfigInvalid => "Game configuration is invalid.",
            Self::NotDownloaded => "You must download this game before reviewing it.",
            Self::RatingOutOfRange => "Rating must be between 1 and 5.",
            Self::RoomNotFound => "No room with that id exists.",
            Self::NotMember => "You are not a member of this room.",
            Self::RoomFull => "This room is already full.",
            Self::WrongState => "This room is not in the required state.",
            Self::VersionMismatch => "Your client's game version does not match the room.",
            Self::NotHost => "Only the room host may perform this action.",
            Self::InsufficientPlayers => "At least two players are required to start.",
            Self::SpawnFailed => "Failed to launch the game server process.",
            Self::TransportFailed => "Failed to reach an upstream service.",
            Self::IoFailed => "A storage operation failed.",
        }
    }
}
