use serde::Serialize;

use crate::protocol::Version;

/// Opaque handle to a supervised subprocess, as seen by a room. The room
/// never reaches into the supervisor beyond this id — reconciliation is
/// message-passing (spec §9).
#[derive(Debug, Clone)]
pub struct GameServerRef {
    pub handle_id: u64,
    pub pid: Option<u32>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Waiting,
    Playing,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub game: String,
    pub version_at_creation: Version,
    pub host: String,
    pub members: Vec<String>,
    pub max_players: u8,
    pub state: RoomState,
    pub game_server: Option<GameServerRef>,
}

impl Room {
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_players as usize
    }

    pub fn is_member(&self, player: &str) -> bool {
        self.members.iter().any(|m| m == player)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub id: String,
    pub game: String,
    pub version: Version,
    pub host: String,
    pub member_count: usize,
    pub max_players: u8,
    pub state: RoomState,
}

impl From<&Room> for RoomSummary {
    fn from(r: &Room) -> Self {
        RoomSummary {
            id: r.id.clone(),
            game: r.game.clone(),
            version: r.version_at_creation,
            host: r.host.clone(),
            member_count: r.members.len(),
            max_players: r.max_players,
            state: r.state,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomStatus {
    #[serde(flatten)]
    pub summary: RoomSummary,
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,
}
