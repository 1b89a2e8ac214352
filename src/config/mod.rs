//! Layered configuration: compiled defaults -> `config.json` -> env vars.
//! Mirrors the teacher's `config` module shape (one submodule per concern,
//! `loader::load()` as the single entry point).

pub mod credential;
pub mod defaults;
pub mod loader;
pub mod logging;
pub mod types;
pub mod validation;

pub use credential::CredentialConfig;
pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use types::Config;
pub use validation::validate;
