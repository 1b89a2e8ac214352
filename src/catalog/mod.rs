//! Authoritative store of game metadata, versioned bundle blobs, and
//! reviews. All mutating operations are serialized behind one mutex
//! (spec §5's lock ordering: Catalog first).

pub mod error;
pub mod model;
pub mod persistence;

pub use error::CatalogError;
pub use model::{
    compute_aggregates, round_rating, ConfigValidationError, Game, GameConfig, GameKind,
    GameSummary, Review,
};

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::protocol::Version;
use persistence::{
    read_json_or_default, write_json, CatalogPaths, GamesDocument, PlayersDocument,
    ReviewsDocument,
};

struct CatalogState {
    games: GamesDocument,
    reviews: ReviewsDocument,
    downloads: PlayersDocument,
}

/// The catalog lifecycle store. One instance is shared (`Arc<Catalog>`)
/// across every connection.
pub struct Catalog {
    paths: CatalogPaths,
    state: Mutex<CatalogState>,
}

impl Catalog {
    /// Loads persisted documents from `data_root`, or starts empty if none
    /// exist yet.
    pub async fn load(data_root: impl Into<PathBuf>) -> Self {
        let paths = CatalogPaths::new(data_root);
        let games = read_json_or_default::<GamesDocument>(&paths.games_metadata_path()).await;
        let reviews = read_json_or_default::<ReviewsDocument>(&paths.reviews_path()).await;
        let downloads = read_json_or_default::<PlayersDocument>(&paths.players_path()).await;
        Catalog {
            paths,
            state: Mutex::new(CatalogState { games, reviews, downloads }),
        }
    }

    pub async fn list_active(&self) -> Vec<GameSummary> {
        let state = self.state.lock().await;
        state.games.values().map(GameSummary::from).collect()
    }

    pub async fn get_info(&self, name: &str) -> Result<(Game, Vec<Review>), CatalogError> {
        let state = self.state.lock().await;
        let game = state
            .games
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        let mut reviews = state.reviews.get(name).cloned().unwrap_or_default();
        reviews.sort_by_key(|r| r.timestamp);
        let last_ten = reviews.into_iter().rev().take(10).collect();
        Ok((game, last_ten))
    }

    pub async fn list_by_developer(&self, developer: &str) -> Vec<GameSummary> {
        let state = self.state.lock().await;
        state
            .games
            .values()
            .filter(|g| g.developer == developer)
            .map(GameSummary::from)
            .collect()
    }

    /// Returns the current version's game-server hint, used by
    /// `RoomRegistry::create` to snapshot `maxPlayers` and validate the
    /// requested version without re-locking the catalog mid-room-op.
    pub async fn snapshot_for_room(&self, name: &str) -> Option<(Version, u8, bool)> {
        let state = self.state.lock().await;
        state
            .games
            .get(name)
            .map(|g| (g.version, g.max_players, g.config.has_game_server()))
    }

    pub async fn config_for(&self, name: &str) -> Option<GameConfig> {
        let state = self.state.lock().await;
        state.games.get(name).map(|g| g.config.clone())
    }

    /// Read-only working directory for a spawned game-server subprocess:
    /// the extracted bundle directory for the game's current version.
    pub async fn work_dir_for(&self, name: &str) -> Option<PathBuf> {
        let state = self.state.lock().await;
        let version = state.games.get(name)?.version;
        Some(self.paths.bundle_dir(name, &version.to_string()))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upload(
        &self,
        developer: &str,
        name: &str,
        kind: GameKind,
        description: String,
        max_players: u8,
        version: Version,
        bundle: Vec<u8>,
        config: GameConfig,
    ) -> Result<(), CatalogError> {
        config
            .validate()
            .map_err(CatalogError::ConfigInvalid)?;
        model::validate_max_players(max_players).map_err(CatalogError::ConfigInvalid)?;

        let mut state = self.state.lock().await;
        if state.games.contains_key(name) {
            return Err(CatalogError::Exists(name.to_string()));
        }

        let bundle_path = self.paths.bundle_file(name, &version.to_string());
        persistence::write_atomic(&bundle_path, &bundle)
            .await
            .map_err(|e| CatalogError::Io(e.to_string()))?;

        let now = Utc::now();
        let game = Game {
            name: name.to_string(),
            developer: developer.to_string(),
            kind,
            description,
            max_players,
            version,
            config,
            created_at: now,
            updated_at: now,
            download_count: 0,
            average_rating: 0.0,
            review_count: 0,
        };

        let mut games = state.games.clone();
        games.insert(name.to_string(), game);
        write_json(&self.paths.games_metadata_path(), &games)
            .await
            .map_err(|e| CatalogError::Io(e.to_string()))?;
        state.games = games;
        Ok(())
    }

    /// Replaces the bundle at `newVersion`, bumps `version`/`updatedAt`.
    /// `notes` is release-notes text supplied by the developer; it has no
    /// persisted home in the catalog document, so it's only logged.
    /// The caller (the developer endpoint) is responsible for invoking
    /// `RoomRegistry::cascade_drop_by_game(name)` afterwards.
    pub async fn update(
        &self,
        developer: &str,
        name: &str,
        new_version: Version,
        bundle: Vec<u8>,
        notes: Option<String>,
    ) -> Result<(), CatalogError> {
        let mut state = self.state.lock().await;
        let game = state
            .games
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        if game.developer != developer {
            return Err(CatalogError::NotOwner(name.to_string()));
        }

        if let Some(notes) = notes.filter(|n| !n.is_empty()) {
            tracing::info!(game = name, developer, notes, "game updated with release notes");
        }

        let bundle_path = self.paths.bundle_file(name, &new_version.to_string());
        persistence::write_atomic(&bundle_path, &bundle)
            .await
            .map_err(|e| CatalogError::Io(e.to_string()))?;

        let mut games = state.games.clone();
        {
            let entry = games.get_mut(name).expect("checked above");
            entry.version = new_version;
            entry.updated_at = Utc::now();
        }
        write_json(&self.paths.games_metadata_path(), &games)
            .await
            .map_err(|e| CatalogError::Io(e.to_string()))?;
        state.games = games;
        Ok(())
    }

    pub async fn remove(&self, developer: &str, name: &str) -> Result<(), CatalogError> {
        let mut state = self.state.lock().await;
        let game = state
            .games
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        if game.developer != developer {
            return Err(CatalogError::NotOwner(name.to_string()));
        }

        let mut games = state.games.clone();
        games.remove(name);
        write_json(&self.paths.games_metadata_path(), &games)
            .await
            .map_err(|e| CatalogError::Io(e.to_string()))?;
        state.games = games;

        let mut reviews = state.reviews.clone();
        if reviews.remove(name).is_some() {
            write_json(&self.paths.reviews_path(), &reviews)
                .await
                .map_err(|e| CatalogError::Io(e.to_string()))?;
            state.reviews = reviews;
        }

        let _ = tokio::fs::remove_dir_all(self.paths.game_dir(name)).await;
        Ok(())
    }

    /// Produces the bundle bytes and launch config for a downloader,
    /// incrementing `downloadCount` and recording download history.
    pub async fn package_bundle(
        &self,
        player: &str,
        name: &str,
    ) -> Result<(Vec<u8>, GameConfig), CatalogError> {
        let mut state = self.state.lock().await;
        let game = state
            .games
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?
            .clone();

        let bundle_path = self.paths.bundle_file(name, &game.version.to_string());
        let bundle = tokio::fs::read(&bundle_path)
            .await
            .map_err(|e| CatalogError::Io(e.to_string()))?;

        let mut games = state.games.clone();
        games.get_mut(name).expect("checked above").download_count += 1;
        write_json(&self.paths.games_metadata_path(), &games)
            .await
            .map_err(|e| CatalogError::Io(e.to_string()))?;
        state.games = games;

        let mut downloads = state.downloads.clone();
        let entry = downloads.entry(player.to_string()).or_default();
        if !entry.downloaded_games.iter().any(|g| g == name) {
            entry.downloaded_games.push(name.to_string());
        }
        write_json(&self.paths.players_path(), &downloads)
            .await
            .map_err(|e| CatalogError::Io(e.to_string()))?;
        state.downloads = downloads;

        Ok((bundle, game.config))
    }

    pub async fn submit_review(
        &self,
        player: &str,
        name: &str,
        rating: u8,
        comment: String,
    ) -> Result<(), CatalogError> {
        if !(1..=5).contains(&rating) {
            return Err(CatalogError::RatingOutOfRange);
        }

        let mut state = self.state.lock().await;
        state
            .games
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;

        let downloaded = state
            .downloads
            .get(player)
            .is_some_and(|h| h.downloaded_games.iter().any(|g| g == name));
        if !downloaded {
            return Err(CatalogError::NotDownloaded(name.to_string()));
        }

        let mut reviews = state.reviews.clone();
        let list = reviews.entry(name.to_string()).or_default();
        list.retain(|r| r.player != player);
        list.push(Review {
            game: name.to_string(),
            player: player.to_string(),
            rating,
            comment,
            timestamp: Utc::now(),
        });
        let (average_rating, review_count) = compute_aggregates(list);

        write_json(&self.paths.reviews_path(), &reviews)
            .await
            .map_err(|e| CatalogError::Io(e.to_string()))?;
        state.reviews = reviews;

        let mut games = state.games.clone();
        {
            let entry = games.get_mut(name).expect("checked above");
            entry.average_rating = average_rating;
            entry.review_count = review_count;
        }
        write_json(&self.paths.games_metadata_path(), &games)
            .await
            .map_err(|e| CatalogError::Io(e.to_string()))?;
        state.games = games;
        Ok(())
    }

    pub async fn get_reviews(&self, name: &str) -> Result<(Vec<Review>, f64, u32), CatalogError> {
        let state = self.state.lock().await;
        let game = state
            .games
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        let reviews = state.reviews.get(name).cloned().unwrap_or_default();
        Ok((reviews, game.average_rating, game.review_count))
    }

    /// Reconciles `averageRating`/`reviewCount` against the persisted
    /// review set. Used at startup to restore consistency if the process
    /// crashed between the reviews.json write and the metadata write
    /// (spec §9 "JSON persistence & race safety").
    pub async fn reconcile_aggregates(&self) -> std::io::Result<()> {
        let mut state = self.state.lock().await;
        let mut games = state.games.clone();
        let mut changed = false;
        for (name, game) in games.iter_mut() {
            let reviews = state.reviews.get(name).cloned().unwrap_or_default();
            let (average_rating, review_count) = compute_aggregates(&reviews);
            if (game.average_rating - average_rating).abs() > f64::EPSILON
                || game.review_count != review_count
            {
                game.average_rating = average_rating;
                game.review_count = review_count;
                changed = true;
            }
        }
        if changed {
            write_json(&self.paths.games_metadata_path(), &games).await?;
            state.games = games;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn valid_config() -> GameConfig {
        GameConfig {
            start_command: "py game.py {host} {port}".into(),
            server_command: None,
            compile_command: None,
        }
    }

    async fn catalog_with_tic(dir: &tempfile::TempDir) -> Catalog {
        let catalog = Catalog::load(dir.path()).await;
        catalog
            .upload(
                "alice",
                "tic",
                GameKind::Cli,
                "tic tac toe".into(),
                2,
                "1.0.0".parse().unwrap(),
                b"bytes".to_vec(),
                valid_config(),
            )
            .await
            .unwrap();
        catalog
    }

    #[tokio::test]
    async fn upload_then_package_round_trips_bytes() {
        let dir = tempdir().unwrap();
        let catalog = catalog_with_tic(&dir).await;
        let (bundle, _config) = catalog.package_bundle("bob", "tic").await.unwrap();
        assert_eq!(bundle, b"bytes".to_vec());

        let games = catalog.list_active().await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].download_count, 1);
    }

    #[tokio::test]
    async fn upload_rejects_duplicate_name() {
        let dir = tempdir().unwrap();
        let catalog = catalog_with_tic(&dir).await;
        let err = catalog
            .upload(
                "alice",
                "tic",
                GameKind::Cli,
                "dup".into(),
                2,
                "1.0.0".parse().unwrap(),
                vec![],
                valid_config(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Exists(_)));
    }

    #[tokio::test]
    async fn review_requires_prior_download() {
        let dir = tempdir().unwrap();
        let catalog = catalog_with_tic(&dir).await;
        let err = catalog
            .submit_review("bob", "tic", 5, "great".into())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotDownloaded(_)));

        catalog.package_bundle("bob", "tic").await.unwrap();
        catalog.submit_review("bob", "tic", 5, "great".into()).await.unwrap();
        let (reviews, avg, count) = catalog.get_reviews("tic").await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(avg, 5.0);
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn second_review_replaces_first() {
        let dir = tempdir().unwrap();
        let catalog = catalog_with_tic(&dir).await;
        catalog.package_bundle("bob", "tic").await.unwrap();
        catalog.submit_review("bob", "tic", 2, "meh".into()).await.unwrap();
        catalog.submit_review("bob", "tic", 5, "actually great".into()).await.unwrap();

        let (reviews, avg, count) = catalog.get_reviews("tic").await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(reviews[0].rating, 5);
        assert_eq!(reviews[0].comment, "actually great");
        assert_eq!(avg, 5.0);
    }

    #[tokio::test]
    async fn rating_out_of_range_rejected() {
        let dir = tempdir().unwrap();
        let catalog = catalog_with_tic(&dir).await;
        catalog.package_bundle("bob", "tic").await.unwrap();
        let err = catalog.submit_review("bob", "tic", 6, "x".into()).await.unwrap_err();
        assert!(matches!(err, CatalogError::RatingOutOfRange));
    }

    #[tokio::test]
    async fn update_requires_ownership() {
        let dir = tempdir().unwrap();
        let catalog = catalog_with_tic(&dir).await;
        let err = catalog
            .update("mallory", "tic", "1.0.1".parse().unwrap(), vec![], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotOwner(_)));
    }

    #[tokio::test]
    async fn remove_deletes_metadata_and_reviews() {
        let dir = tempdir().unwrap();
        let catalog = catalog_with_tic(&dir).await;
        catalog.remove("alice", "tic").await.unwrap();
        let err = catalog.get_info("tic").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn persisted_state_reloads_after_restart() {
        let dir = tempdir().unwrap();
        {
            let catalog = catalog_with_tic(&dir).await;
            catalog.package_bundle("bob", "tic").await.unwrap();
        }
        let reloaded = Catalog::load(dir.path()).await;
        let (game, _) = reloaded.get_info("tic").await.unwrap();
        assert_eq!(game.download_count, 1);
    }
}
