use thiserror::Error;

use crate::protocol::ErrorCode;

/// Errors raised while reading or writing a length-prefixed frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The peer closed the connection before (or between) frames.
    #[error("connection closed by peer")]
    Closed,

    /// The declared frame length exceeds [`crate::transport::MAX_FRAME_BYTES`],
    /// or the payload is not valid UTF-8 JSON.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The stream ended in the middle of a frame's payload.
    #[error("connection truncated mid-frame")]
    Truncated,

    /// Any other I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FrameError::Closed => ErrorCode::TransportClosed,
            FrameError::Malformed(_) => ErrorCode::MalformedFrame,
            FrameError::Truncated => ErrorCode::TransportClosed,
            FrameError::Io(_) => ErrorCode::IoFailed,
        }
    }
}
