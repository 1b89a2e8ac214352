//! Wire protocol: handshake/request/response envelopes, the error code
//! taxonomy, per-role action enumerations, and the shared `Version` type.

pub mod actions;
pub mod envelope;
pub mod error_codes;
pub mod version;

pub use actions::{is_developer_action, is_player_action, DeveloperAction, PlayerAction};
pub use envelope::{
    ClientType, HandshakeRequest, HandshakeResponse, RequestFrame, ResponseFrame, ServerType,
};
pub use error_codes::ErrorCode;
pub use version::{Version, VersionParseError};
