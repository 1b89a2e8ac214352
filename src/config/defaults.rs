//! Default value functions for configuration fields, used by serde's
//! `#[serde(default = ...)]` attributes.

use super::logging::LogFormat;

pub fn default_data_dir() -> String {
    ".".to_string()
}

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "game-store-server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Text
}

pub const fn default_credential_connect_timeout_ms() -> u64 {
    2_000
}

pub const fn default_credential_max_attempts() -> u32 {
    4
}

pub const fn default_player_read_deadline_secs() -> u64 {
    30
}
