//! JSON document persistence and bundle blob storage.
//!
//! Every document is written temp-file-then-rename so a reader never
//! observes a partially-written document, and a write failure leaves the
//! previous document untouched on disk (spec §4.3, §7).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::AsyncWriteExt;

use super::model::{Game, Review};

pub struct CatalogPaths {
    pub root: PathBuf,
}

impl CatalogPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root.join("game_store_data")
    }

    pub fn games_metadata_path(&self) -> PathBuf {
        self.store_dir().join("games_metadata.json")
    }

    pub fn reviews_path(&self) -> PathBuf {
        self.store_dir().join("reviews.json")
    }

    pub fn players_path(&self) -> PathBuf {
        self.root.join("players.json")
    }

    pub fn bundle_dir(&self, game: &str, version: &str) -> PathBuf {
        self.root.join("uploaded_games").join(game).join(version)
    }

    pub fn bundle_file(&self, game: &str, version: &str) -> PathBuf {
        self.bundle_dir(game, version).join("bundle.bin")
    }

    pub fn game_dir(&self, game: &str) -> PathBuf {
        self.root.join("uploaded_games").join(game)
    }
}

/// Writes `contents` to `path` via a sibling `.tmp` file and an atomic
/// rename, creating parent directories as needed.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("tmp")
    ));
    let write_result = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if write_result.is_err() {
        let _ = tokio::fs::remove_file(&tmp_path).await;
    }
    write_result
}

pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    write_atomic(path, &bytes).await
}

pub async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => T::default(),
    }
}

pub type GamesDocument = HashMap<String, Game>;
pub type ReviewsDocument = HashMap<String, Vec<Review>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct PlayerHistory {
    pub downloaded_games: Vec<String>,
}

pub type PlayersDocument = HashMap<String, PlayerHistory>;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_atomic_leaves_no_tmp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("doc.json");
        write_atomic(&path, b"{}").await.unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn read_json_or_default_handles_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let doc: GamesDocument = read_json_or_default(&path).await;
        assert!(doc.is_empty());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("players.json");
        let mut doc = PlayersDocument::new();
        doc.insert(
            "bob".to_string(),
            PlayerHistory { downloaded_games: vec!["tic".to_string()] },
        );
        write_json(&path, &doc).await.unwrap();
        let read_back: PlayersDocument = read_json_or_default(&path).await;
        assert_eq!(read_back, doc);
    }
}
