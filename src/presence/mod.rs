//! Tracks authenticated player sessions and enforces at-most-one active
//! session per player. Backed by `dashmap::DashMap`, matching the teacher's
//! choice for connection/session maps where independent per-key access
//! dominates over whole-table scans (spec §5).

pub mod error;

pub use error::PresenceError;

use dashmap::DashMap;
use serde::Serialize;

use crate::room::{RoomRegistry, RoomState};

#[derive(Debug, Clone)]
pub struct PresenceEntry {
    pub player: String,
    pub connection: String,
    pub room_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Playing,
    InRoom,
    Idle,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresenceSummary {
    pub player: String,
    pub status: PresenceStatus,
}

#[derive(Default)]
pub struct PresenceTable {
    entries: DashMap<String, PresenceEntry>,
}

impl PresenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&self, player: &str, connection: &str) -> Result<(), PresenceError> {
        use dashmap::mapref::entry::Entry;
        match self.entries.entry(player.to_string()) {
            Entry::Occupied(_) => Err(PresenceError::AlreadyOnline),
            Entry::Vacant(slot) => {
                slot.insert(PresenceEntry {
                    player: player.to_string(),
                    connection: connection.to_string(),
                    room_ref: None,
                });
                Ok(())
            }
        }
    }

    pub fn logout(&self, player: &str) {
        self.entries.remove(player);
    }

    pub fn is_online(&self, player: &str) -> bool {
        self.entries.contains_key(player)
    }

    pub fn set_room(&self, player: &str, room_id: Option<String>) {
        if let Some(mut entry) = self.entries.get_mut(player) {
            entry.room_ref = room_id;
        }
    }

    /// Snapshot of every online player with derived status, sorted by
    /// `(status rank, name)` where rank is `playing < inRoom < idle`.
    pub async fn list(&self, rooms: &RoomRegistry) -> Vec<PresenceSummary> {
        let snapshot: Vec<PresenceEntry> = self.entries.iter().map(|e| e.clone()).collect();

        let mut summaries = Vec::with_capacity(snapshot.len());
        for entry in snapshot {
            let status = match &entry.room_ref {
                Some(room_id) => match rooms.room_state(room_id).await {
                    Some(RoomState::Playing) => PresenceStatus::Playing,
                    Some(RoomState::Waiting) => PresenceStatus::InRoom,
                    None => PresenceStatus::Idle,
                },
                None => PresenceStatus::Idle,
            };
            summaries.push(PresenceSummary { player: entry.player, status });
        }

        summaries.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.player.cmp(&b.player)));
        summaries
    }
}
