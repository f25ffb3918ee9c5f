use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use vocab_core::model::{AchievementSet, LearnerId, Snapshot};

use crate::document::{
    AchievementsDocument, ProgressDocument, achievements_document, parse_achievements,
};
use crate::repository::{ProgressRepository, Storage, StorageError};

/// Stores each learner as two JSON files in one directory:
/// `<learner>_progress.json` and `<learner>_achievements.json`.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    /// Use `dir` as the data directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn progress_path(&self, learner: &LearnerId) -> PathBuf {
        self.dir.join(format!("{learner}_progress.json"))
    }

    #[must_use]
    pub fn achievements_path(&self, learner: &LearnerId) -> PathBuf {
        self.dir.join(format!("{learner}_achievements.json"))
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Write through a sibling temp file so a crash never leaves half a document.
async fn write_replace(path: &Path, contents: &str) -> Result<(), StorageError> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl ProgressRepository for JsonFileRepository {
    async fn load_progress(&self, learner: &LearnerId) -> Result<Option<Snapshot>, StorageError> {
        let Some(progress) = read_optional(&self.progress_path(learner)).await? else {
            debug!(%learner, "no stored progress");
            return Ok(None);
        };

        let achievements = match read_optional(&self.achievements_path(learner)).await? {
            Some(bytes) => {
                let doc: AchievementsDocument = serde_json::from_slice(&bytes)
                    .map_err(|err| StorageError::corrupt(learner, err))?;
                parse_achievements(doc.keys().map(String::as_str))
                    .map_err(|err| StorageError::corrupt(learner, err))?
            }
            None => AchievementSet::new(),
        };

        let snapshot = ProgressDocument::from_json(&progress)
            .and_then(|doc| doc.into_snapshot(achievements))
            .map_err(|err| {
                warn!(%learner, error = %err, "stored progress is corrupt");
                StorageError::corrupt(learner, err)
            })?;

        debug!(%learner, records = snapshot.history.len(), "loaded progress");
        Ok(Some(snapshot))
    }

    async fn save_progress(
        &self,
        learner: &LearnerId,
        snapshot: &Snapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let progress = ProgressDocument::from_snapshot(snapshot, saved_at)
            .to_json()
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let achievements =
            serde_json::to_string_pretty(&achievements_document(snapshot.profile.achievements()))
                .map_err(|err| StorageError::Serialization(err.to_string()))?;

        write_replace(&self.progress_path(learner), &progress).await?;
        write_replace(&self.achievements_path(learner), &achievements).await?;

        debug!(%learner, "saved progress");
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` backed by per-learner JSON files in `dir`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn json_dir(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let repo = JsonFileRepository::open(dir).await?;
        Ok(Self {
            progress: Arc::new(repo),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn paths_are_keyed_by_learner() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path()).await.unwrap();
        let learner = LearnerId::new("anna").unwrap();

        assert_eq!(
            repo.progress_path(&learner),
            dir.path().join("anna_progress.json")
        );
        assert_eq!(
            repo.achievements_path(&learner),
            dir.path().join("anna_achievements.json")
        );
    }

    #[tokio::test]
    async fn open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("progress");
        let repo = JsonFileRepository::open(&nested).await.unwrap();
        assert!(repo.dir().is_dir());
    }
}
