//! Configuration validation.

use std::path::Path;

use super::Config;

/// Validates that the configured data directory is usable and the
/// credential-retry policy is coherent. Unlike the teacher's security
/// validation, this crate has no TLS or auth-token surface to check.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    let data_dir = Path::new(&config.data_dir);
    if data_dir.exists() && !data_dir.is_dir() {
        anyhow::bail!("data_dir '{}' exists and is not a directory", config.data_dir);
    }

    if config.credential.max_attempts == 0 {
        anyhow::bail!("credential.max_attempts must be at least 1");
    }
    if config.credential.connect_timeout_ms == 0 {
        anyhow::bail!("credential.connect_timeout_ms must be greater than 0");
    }
    if config.player_read_deadline_secs == 0 {
        anyhow::bail!("player_read_deadline_secs must be greater than 0");
    }

    Ok(())
}
