//! Root configuration type.

use serde::{Deserialize, Serialize};

use super::credential::CredentialConfig;
use super::defaults::{default_data_dir, default_player_read_deadline_secs};
use super::logging::LoggingConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server data root: holds `game_store_data/`, `uploaded_games/`,
    /// `players.json`, and the `.dev_port`/`.lobby_port` discovery files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub credential: CredentialConfig,
    /// Receive deadline, in seconds, for player connections (spec §5). The
    /// developer endpoint leaves its read unbounded.
    #[serde(default = "default_player_read_deadline_secs")]
    pub player_read_deadline_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            logging: LoggingConfig::default(),
            credential: CredentialConfig::default(),
            player_read_deadline_secs: default_player_read_deadline_secs(),
        }
    }
}
