use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::Version;

/// Kind of game a catalog entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Cli,
    Gui,
    Multiplayer,
}

/// Launch configuration for a game's current version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Must contain literal `{host}` and `{port}` placeholders.
    pub start_command: String,
    /// If present, must contain literal `{port}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    MissingStartCommand,
    StartCommandMissingHost,
    StartCommandMissingPort,
    ServerCommandMissingPort,
    MaxPlayersOutOfRange,
}

impl ConfigValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingStartCommand => "startCommand is required",
            Self::StartCommandMissingHost => "startCommand must contain the literal {host}",
            Self::StartCommandMissingPort => "startCommand must contain the literal {port}",
            Self::ServerCommandMissingPort => "serverCommand must contain the literal {port}",
            Self::MaxPlayersOutOfRange => "maxPlayers must be between 1 and 100",
        }
    }
}

/// `maxPlayers` must be in `1..=100`.
pub fn validate_max_players(max_players: u8) -> Result<(), ConfigValidationError> {
    if (1..=100).contains(&max_players) {
        Ok(())
    } else {
        Err(ConfigValidationError::MaxPlayersOutOfRange)
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.start_command.trim().is_empty() {
            return Err(ConfigValidationError::MissingStartCommand);
        }
        if !self.start_command.contains("{host}") {
            return Err(ConfigValidationError::StartCommandMissingHost);
        }
        if !self.start_command.contains("{port}") {
            return Err(ConfigValidationError::StartCommandMissingPort);
        }
        if let Some(server_command) = &self.server_command {
            if !server_command.contains("{port}") {
                return Err(ConfigValidationError::ServerCommandMissingPort);
            }
        }
        Ok(())
    }

    pub fn has_game_server(&self) -> bool {
        self.server_command.is_some()
    }
}

/// A catalog entry: metadata for the current version of one published game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub name: String,
    pub developer: String,
    pub kind: GameKind,
    pub description: String,
    pub max_players: u8,
    pub version: Version,
    pub config: GameConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub download_count: u64,
    pub average_rating: f64,
    pub review_count: u32,
}

/// Public-facing summary returned by `listActive`/`listByDeveloper`.
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub name: String,
    pub developer: String,
    pub kind: GameKind,
    pub description: String,
    pub max_players: u8,
    pub version: Version,
    pub has_game_server: bool,
    pub download_count: u64,
    pub average_rating: f64,
    pub review_count: u32,
}

impl From<&Game> for GameSummary {
    fn from(g: &Game) -> Self {
        GameSummary {
            name: g.name.clone(),
            developer: g.developer.clone(),
            kind: g.kind,
            description: g.description.clone(),
            max_players: g.max_players,
            version: g.version,
            has_game_server: g.config.has_game_server(),
            download_count: g.download_count,
            average_rating: g.average_rating,
            review_count: g.review_count,
        }
    }
}

/// A single `{game, player, rating, comment, timestamp}` review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub game: String,
    pub player: String,
    pub rating: u8,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

/// Rounds to 2 decimal places using the same half-up convention regardless
/// of platform float rounding mode.
pub fn round_rating(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn compute_aggregates(reviews: &[Review]) -> (f64, u32) {
    if reviews.is_empty() {
        return (0.0, 0);
    }
    let sum: u32 = reviews.iter().map(|r| r.rating as u32).sum();
    let avg = sum as f64 / reviews.len() as f64;
    (round_rating(avg), reviews.len() as u32)
}
