use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ErrorCode;

/// The role a connection commits to on its first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Developer,
    Player,
}

/// The role the listener announces back once a handshake matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    Developer,
    Lobby,
}

impl From<ClientType> for ServerType {
    fn from(kind: ClientType) -> Self {
        match kind {
            ClientType::Developer => ServerType::Developer,
            ClientType::Player => ServerType::Lobby,
        }
    }
}

/// Client -> server handshake frame: `{"client_type": "developer"|"player"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeRequest {
    pub client_type: ClientType,
}

/// Server -> client handshake response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HandshakeResponse {
    Success {
        server_type: ServerType,
    },
    Error {
        message: String,
    },
}

/// `{"action": "<name>", "data": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestFrame {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

/// `{"status": "success"|"error", "message"?: "...", "data"?: {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseFrame {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
}

impl ResponseFrame {
    pub fn ok() -> Self {
        ResponseFrame::Success { data: None }
    }

    pub fn ok_with(data: impl Serialize) -> Self {
        ResponseFrame::Success {
            data: serde_json::to_value(data).ok(),
        }
    }

    pub fn error(code: ErrorCode) -> Self {
        ResponseFrame::Error {
            message: code.description().to_string(),
            code: Some(code),
        }
    }

    pub fn error_with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        ResponseFrame::Error {
            message: message.into(),
            code: Some(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_response_matches_spec_shape() {
        let resp = HandshakeResponse::Success {
            server_type: ServerType::Lobby,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["server_type"], "lobby");
    }

    #[test]
    fn response_frame_success_omits_data_when_absent() {
        let json = serde_json::to_value(ResponseFrame::ok()).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn response_frame_error_carries_code_and_message() {
        let json = serde_json::to_value(ResponseFrame::error(ErrorCode::RoomFull)).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "ROOM_FULL");
        assert!(json["message"].as_str().unwrap().contains("full"));
    }
}
