//! In-memory room lifecycle: creation, membership, and the waiting/playing
//! state machine, including handoff to [`crate::supervisor::Supervisor`] for
//! multiplayer game servers.
//!
//! Lock ordering: a caller that needs both the catalog and the room table
//! must acquire the catalog lock first (spec §5). None of these methods
//! hold the room-table lock across an `.await` on the supervisor or the
//! catalog — each acquisition is short-lived.

pub mod error;
pub mod model;

pub use error::RoomError;
pub use model::{GameServerRef, Room, RoomState, RoomStatus, RoomSummary};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::metrics::ServerMetrics;
use crate::protocol::Version;
use crate::supervisor::Supervisor;

pub struct RoomRegistry {
    catalog: Arc<Catalog>,
    supervisor: Arc<Supervisor>,
    rooms: Mutex<HashMap<String, Room>>,
    next_id: AtomicU64,
    metrics: Arc<ServerMetrics>,
}

impl RoomRegistry {
    pub fn new(catalog: Arc<Catalog>, supervisor: Arc<Supervisor>, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            catalog,
            supervisor,
            rooms: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            metrics,
        }
    }

    pub async fn list(&self) -> Vec<RoomSummary> {
        let rooms = self.rooms.lock().await;
        rooms.values().map(RoomSummary::from).collect()
    }

    pub async fn create(
        &self,
        host: &str,
        game: &str,
        client_version: Version,
    ) -> Result<RoomSummary, RoomError> {
        let (version, max_players, _has_server) = self
            .catalog
            .snapshot_for_room(game)
            .await
            .ok_or_else(|| RoomError::GameUnavailable(game.to_string()))?;
        if version != client_version {
            return Err(RoomError::VersionMismatch);
        }

        let id = self.allocate_id();
        let room = Room {
            id: id.clone(),
            game: game.to_string(),
            version_at_creation: version,
            host: host.to_string(),
            members: vec![host.to_string()],
            max_players,
            state: RoomState::Waiting,
            game_server: None,
        };
        let summary = RoomSummary::from(&room);

        let mut rooms = self.rooms.lock().await;
        rooms.insert(id, room);
        Ok(summary)
    }

    pub async fn join(
        &self,
        room_id: &str,
        player: &str,
        client_version: Version,
    ) -> Result<RoomSummary, RoomError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;

        if room.is_member(player) {
            return Ok(RoomSummary::from(&*room));
        }
        if room.state != RoomState::Waiting {
            return Err(RoomError::WrongState);
        }
        if room.version_at_creation != client_version {
            return Err(RoomError::VersionMismatch);
        }
        if room.is_full() {
            return Err(RoomError::Full);
        }

        room.members.push(player.to_string());
        Ok(RoomSummary::from(&*room))
    }

    /// If `player` is the host, the room disbands (and any live game server
    /// is stopped) — otherwise `player` is simply removed, and the room is
    /// destroyed if that empties it.
    pub async fn leave(&self, room_id: &str, player: &str) -> Result<(), RoomError> {
        let server_to_stop = {
            let mut rooms = self.rooms.lock().await;
            let room = rooms
                .get(room_id)
                .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
            if !room.is_member(player) {
                return Err(RoomError::NotMember);
            }

            if player == room.host {
                let room = rooms.remove(room_id).expect("checked above");
                self.metrics.increment_rooms_destroyed();
                room.game_server.and_then(|s| s.pid)
            } else {
                let room = rooms.get_mut(room_id).expect("checked above");
                room.members.retain(|m| m != player);
                if room.members.is_empty() {
                    let room = rooms.remove(room_id).expect("checked above");
                    self.metrics.increment_rooms_destroyed();
                    room.game_server.and_then(|s| s.pid)
                } else {
                    None
                }
            }
        };

        if let Some(pid) = server_to_stop {
            self.supervisor.stop(pid).await;
        }
        Ok(())
    }

    pub async fn get(&self, room_id: &str, requester: &str) -> Result<RoomStatus, RoomError> {
        let rooms = self.rooms.lock().await;
        let room = rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        if !room.is_member(requester) {
            return Err(RoomError::NotMember);
        }
        Ok(RoomStatus {
            summary: RoomSummary::from(room),
            members: room.members.clone(),
            server_port: room.game_server.as_ref().and_then(|s| s.port),
        })
    }

    /// Launches the game server (if the game has one) and transitions the
    /// room to `playing`. `self_arc` is used to spawn the background task
    /// that reconciles room state once the supervised process exits —
    /// message-passing rather than a back-pointer into the supervisor.
    pub async fn start_game(
        self_arc: &Arc<Self>,
        room_id: &str,
        host: &str,
    ) -> Result<RoomSummary, RoomError> {
        let config = {
            let rooms = self_arc.rooms.lock().await;
            let room = rooms
                .get(room_id)
                .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
            if room.host != host {
                return Err(RoomError::NotHost);
            }
            if room.state != RoomState::Waiting {
                return Err(RoomError::WrongState);
            }
            if room.members.len() < 2 {
                return Err(RoomError::InsufficientPlayers);
            }
            self_arc
                .catalog
                .config_for(&room.game)
                .await
                .ok_or_else(|| RoomError::GameUnavailable(room.game.clone()))?
        };

        let game_server = if let Some(server_command) = config.server_command.as_deref() {
            let member_count = {
                let rooms = self_arc.rooms.lock().await;
                rooms.get(room_id).map(|r| r.members.len()).unwrap_or(0)
            };
            let work_dir = {
                let rooms = self_arc.rooms.lock().await;
                let game = rooms.get(room_id).map(|r| r.game.clone());
                match game {
                    Some(g) => self_arc.catalog.work_dir_for(&g).await,
                    None => None,
                }
            };

            let (handle, exit_rx) = self_arc
                .supervisor
                .spawn(server_command, work_dir.as_deref(), member_count)
                .await
                .map_err(|e| RoomError::SpawnFailed(e.to_string()))?;

            let registry = Arc::clone(self_arc);
            let watched_room = room_id.to_string();
            tokio::spawn(async move {
                if let Ok(report) = exit_rx.await {
                    registry.on_game_server_exit(&watched_room, report.exit_code).await;
                }
            });

            GameServerRef {
                handle_id: handle.handle_id,
                pid: handle.pid,
                port: Some(handle.port),
            }
        } else {
            GameServerRef { handle_id: 0, pid: None, port: None }
        };

        let mut rooms = self_arc.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        room.state = RoomState::Playing;
        room.game_server = Some(game_server);
        Ok(RoomSummary::from(&*room))
    }

    pub async fn reset(&self, room_id: &str, host: &str) -> Result<RoomSummary, RoomError> {
        let pid_to_stop = {
            let rooms = self.rooms.lock().await;
            let room = rooms
                .get(room_id)
                .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
            if room.host != host {
                return Err(RoomError::NotHost);
            }
            room.game_server.as_ref().filter(|s| s.handle_id != 0).and_then(|s| s.pid)
        };
        if let Some(pid) = pid_to_stop {
            self.supervisor.stop(pid).await;
        }

        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        room.state = RoomState::Waiting;
        room.game_server = None;
        Ok(RoomSummary::from(&*room))
    }

    /// Destroys every room hosting `game`, stopping any live subprocess
    /// first. Called by the developer endpoint after `update`/`remove`.
    pub async fn cascade_drop_by_game(&self, game: &str) -> Vec<RoomSummary> {
        let mut rooms = self.rooms.lock().await;
        let dead: Vec<String> = rooms
            .values()
            .filter(|r| r.game == game)
            .map(|r| r.id.clone())
            .collect();

        let mut destroyed = Vec::new();
        for id in dead {
            if let Some(room) = rooms.remove(&id) {
                if let Some(pid) = room.game_server.as_ref().and_then(|s| s.pid) {
                    self.supervisor.stop(pid).await;
                }
                self.metrics.increment_rooms_destroyed();
                destroyed.push(RoomSummary::from(&room));
            }
        }
        destroyed
    }

    /// Invoked from the background task spawned in `start_game` once the
    /// supervised process exits, for any reason. A no-op if the room was
    /// already destroyed (host left, cascade drop) in the meantime.
    pub async fn on_game_server_exit(&self, room_id: &str, _exit_code: Option<i32>) {
        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get_mut(room_id) {
            if room.state == RoomState::Playing {
                room.state = RoomState::Waiting;
                room.game_server = None;
            }
        }
    }

    /// Unguarded peek at a room's state, used by `PresenceTable::list` to
    /// derive per-player status. Not membership-gated: presence status is
    /// not sensitive the way room contents are.
    pub async fn room_state(&self, room_id: &str) -> Option<RoomState> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map(|r| r.state)
    }

    fn allocate_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("ROOM_{n:04}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GameConfig, GameKind};
    use tempfile::tempdir;

    async fn registry_with_tic(dir: &tempfile::TempDir) -> Arc<RoomRegistry> {
        let catalog = Arc::new(Catalog::load(dir.path()).await);
        catalog
            .upload(
                "alice",
                "tic",
                GameKind::Cli,
                "tic tac toe".into(),
                2,
                "1.0.0".parse().unwrap(),
                b"bytes".to_vec(),
                GameConfig {
                    start_command: "py game.py {host} {port}".into(),
                    server_command: None,
                    compile_command: None,
                },
            )
            .await
            .unwrap();
        let supervisor = Arc::new(Supervisor::new(dir.path().join("logs")));
        let metrics = Arc::new(crate::metrics::ServerMetrics::new());
        Arc::new(RoomRegistry::new(catalog, supervisor, metrics))
    }

    #[tokio::test]
    async fn create_then_join_then_leave() {
        let dir = tempdir().unwrap();
        let registry = registry_with_tic(&dir).await;
        let room = registry.create("alice", "tic", "1.0.0".parse().unwrap()).await.unwrap();
        registry.join(&room.id, "bob", "1.0.0".parse().unwrap()).await.unwrap();

        let status = registry.get(&room.id, "bob").await.unwrap();
        assert_eq!(status.members, vec!["alice", "bob"]);

        registry.leave(&room.id, "bob").await.unwrap();
        let status = registry.get(&room.id, "alice").await.unwrap();
        assert_eq!(status.members, vec!["alice"]);
    }

    #[tokio::test]
    async fn join_rejects_version_mismatch() {
        let dir = tempdir().unwrap();
        let registry = registry_with_tic(&dir).await;
        let room = registry.create("alice", "tic", "1.0.0".parse().unwrap()).await.unwrap();
        let err = registry
            .join(&room.id, "bob", "2.0.0".parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::VersionMismatch));
    }

    #[tokio::test]
    async fn host_leaving_disbands_room() {
        let dir = tempdir().unwrap();
        let registry = registry_with_tic(&dir).await;
        let room = registry.create("alice", "tic", "1.0.0".parse().unwrap()).await.unwrap();
        registry.join(&room.id, "bob", "1.0.0".parse().unwrap()).await.unwrap();
        registry.leave(&room.id, "alice").await.unwrap();
        let err = registry.get(&room.id, "bob").await.unwrap_err();
        assert!(matches!(err, RoomError::NotFound(_)));
    }

    #[tokio::test]
    async fn start_game_without_server_command_goes_straight_to_playing() {
        let dir = tempdir().unwrap();
        let registry = registry_with_tic(&dir).await;
        let room = registry.create("alice", "tic", "1.0.0".parse().unwrap()).await.unwrap();
        registry.join(&room.id, "bob", "1.0.0".parse().unwrap()).await.unwrap();

        let summary = RoomRegistry::start_game(&registry, &room.id, "alice").await.unwrap();
        assert_eq!(summary.state, RoomState::Playing);
        let status = registry.get(&room.id, "alice").await.unwrap();
        assert_eq!(status.server_port, None);
    }

    #[tokio::test]
    async fn start_game_requires_host() {
        let dir = tempdir().unwrap();
        let registry = registry_with_tic(&dir).await;
        let room = registry.create("alice", "tic", "1.0.0".parse().unwrap()).await.unwrap();
        registry.join(&room.id, "bob", "1.0.0".parse().unwrap()).await.unwrap();
        let err = RoomRegistry::start_game(&registry, &room.id, "bob").await.unwrap_err();
        assert!(matches!(err, RoomError::NotHost));
    }

    #[tokio::test]
    async fn start_game_requires_two_players() {
        let dir = tempdir().unwrap();
        let registry = registry_with_tic(&dir).await;
        let room = registry.create("alice", "tic", "1.0.0".parse().unwrap()).await.unwrap();
        let err = RoomRegistry::start_game(&registry, &room.id, "alice").await.unwrap_err();
        assert!(matches!(err, RoomError::InsufficientPlayers));
    }

    #[tokio::test]
    async fn cascade_drop_destroys_every_room_for_a_game() {
        let dir = tempdir().unwrap();
        let registry = registry_with_tic(&dir).await;
        let room_a = registry.create("alice", "tic", "1.0.0".parse().unwrap()).await.unwrap();
        let room_b = registry.create("carol", "tic", "1.0.0".parse().unwrap()).await.unwrap();

        let destroyed = registry.cascade_drop_by_game("tic").await;
        assert_eq!(destroyed.len(), 2);
        assert!(registry.get(&room_a.id, "alice").await.is_err());
        assert!(registry.get(&room_b.id, "carol").await.is_err());
    }

    #[tokio::test]
    async fn concurrent_join_for_the_last_slot_admits_exactly_one() {
        let dir = tempdir().unwrap();
        let registry = registry_with_tic(&dir).await;
        let room = registry.create("alice", "tic", "1.0.0".parse().unwrap()).await.unwrap();

        let (bob_result, carol_result) = tokio::join!(
            registry.join(&room.id, "bob", "1.0.0".parse().unwrap()),
            registry.join(&room.id, "carol", "1.0.0".parse().unwrap()),
        );

        let outcomes = [bob_result, carol_result];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes.iter().filter(|r| matches!(r, Err(RoomError::Full))).count(),
            1
        );

        let status = registry.get(&room.id, "alice").await.unwrap();
        assert_eq!(status.members.len(), 2);
    }

    #[tokio::test]
    async fn destroying_rooms_increments_the_metric() {
        let dir = tempdir().unwrap();
        let registry = registry_with_tic(&dir).await;

        let room_a = registry.create("alice", "tic", "1.0.0".parse().unwrap()).await.unwrap();
        registry.leave(&room_a.id, "alice").await.unwrap();
        assert_eq!(registry.metrics.snapshot().rooms_destroyed, 1);

        registry.create("bob", "tic", "1.0.0".parse().unwrap()).await.unwrap();
        registry.cascade_drop_by_game("tic").await;
        assert_eq!(registry.metrics.snapshot().rooms_destroyed, 2);
    }
}
