use thiserror::Error;

use crate::protocol::ErrorCode;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("game server exited immediately after launch")]
    ImmediateExit,

    #[error("failed to spawn process: {0}")]
    Spawn(String),
}

impl SupervisorError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::SpawnFailed
    }
}
