//! Configuration for the `CredentialClient`'s connection to the external
//! credential store process.

use serde::{Deserialize, Serialize};

use super::defaults::{default_credential_connect_timeout_ms, default_credential_max_attempts};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    #[serde(default = "default_credential_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Bounded retry count for transient connect failures; a hung credential
    /// store must surface as a transport error rather than hang a session.
    #[serde(default = "default_credential_max_attempts")]
    pub max_attempts: u32,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_credential_connect_timeout_ms(),
            max_attempts: default_credential_max_attempts(),
        }
    }
}
