//! Lightweight in-process counters: active rooms, active sessions, spawned
//! game servers, RPC volume. No external time-series sink (non-goal) — a
//! snapshot is logged periodically and available to `--print-config`-style
//! diagnostics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct ServerMetrics {
    pub developer_connections: AtomicU64,
    pub player_connections: AtomicU64,
    pub rpc_requests: AtomicU64,
    pub rpc_errors: AtomicU64,
    pub rooms_created: AtomicU64,
    pub rooms_destroyed: AtomicU64,
    pub game_servers_spawned: AtomicU64,
    pub game_servers_spawn_failures: AtomicU64,
    pub games_uploaded: AtomicU64,
    pub bundles_downloaded: AtomicU64,
    pub retry_attempts: AtomicU64,
    pub retry_successes: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub developer_connections: u64,
    pub player_connections: u64,
    pub rpc_requests: u64,
    pub rpc_errors: u64,
    pub rooms_created: u64,
    pub rooms_destroyed: u64,
    pub game_servers_spawned: u64,
    pub game_servers_spawn_failures: u64,
    pub games_uploaded: u64,
    pub bundles_downloaded: u64,
    pub retry_attempts: u64,
    pub retry_successes: u64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_developer_connections(&self) {
        self.developer_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_player_connections(&self) {
        self.player_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rpc_requests(&self) {
        self.rpc_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rpc_errors(&self) {
        self.rpc_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rooms_created(&self) {
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rooms_destroyed(&self) {
        self.rooms_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_game_servers_spawned(&self) {
        self.game_servers_spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_game_servers_spawn_failures(&self) {
        self.game_servers_spawn_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_games_uploaded(&self) {
        self.games_uploaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_bundles_downloaded(&self) {
        self.bundles_downloaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retry_attempts(&self) {
        self.retry_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retry_successes(&self) {
        self.retry_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            developer_connections: self.developer_connections.load(Ordering::Relaxed),
            player_connections: self.player_connections.load(Ordering::Relaxed),
            rpc_requests: self.rpc_requests.load(Ordering::Relaxed),
            rpc_errors: self.rpc_errors.load(Ordering::Relaxed),
            rooms_created: self.rooms_created.load(Ordering::Relaxed),
            rooms_destroyed: self.rooms_destroyed.load(Ordering::Relaxed),
            game_servers_spawned: self.game_servers_spawned.load(Ordering::Relaxed),
            game_servers_spawn_failures: self.game_servers_spawn_failures.load(Ordering::Relaxed),
            games_uploaded: self.games_uploaded.load(Ordering::Relaxed),
            bundles_downloaded: self.bundles_downloaded.load(Ordering::Relaxed),
            retry_attempts: self.retry_attempts.load(Ordering::Relaxed),
            retry_successes: self.retry_successes.load(Ordering::Relaxed),
        }
    }
}
