use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use vocab_core::model::{LearnerId, Snapshot};

use crate::document::DocumentError;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Stored progress exists but cannot be read back. Never treated as a
    /// new learner.
    #[error("corrupt progress for learner {learner}: {source}")]
    Corrupt {
        learner: String,
        #[source]
        source: DocumentError,
    },
}

impl StorageError {
    #[must_use]
    pub fn corrupt(learner: &LearnerId, source: impl Into<DocumentError>) -> Self {
        Self::Corrupt {
            learner: learner.to_string(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Persistence contract for learner progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the stored snapshot for a learner.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` if stored data cannot be decoded, or
    /// other storage errors if it cannot be read.
    async fn load_progress(&self, learner: &LearnerId) -> Result<Option<Snapshot>, StorageError>;

    /// Durably store a learner's snapshot, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_progress(
        &self,
        learner: &LearnerId,
        snapshot: &Snapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<LearnerId, (Snapshot, DateTime<Utc>)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When the learner's snapshot was last saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn saved_at(&self, learner: &LearnerId) -> Result<Option<DateTime<Utc>>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(learner).map(|(_, saved_at)| *saved_at))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self, learner: &LearnerId) -> Result<Option<Snapshot>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(learner).map(|(snapshot, _)| snapshot.clone()))
    }

    async fn save_progress(
        &self,
        learner: &LearnerId,
        snapshot: &Snapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(learner.clone(), (snapshot.clone(), saved_at));
        Ok(())
    }
}

/// Puts the progress repository behind a trait object for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_core::ReviewHistoryStore;
    use vocab_core::model::{LearnerProfile, LessonId, QuestionIndex, ReviewOutcome};
    use vocab_core::time::fixed_now;

    #[tokio::test]
    async fn unknown_learner_loads_as_none() {
        let repo = InMemoryRepository::new();
        let learner = LearnerId::new("nobody").unwrap();
        assert!(repo.load_progress(&learner).await.unwrap().is_none());
        assert!(repo.saved_at(&learner).unwrap().is_none());
    }

    #[tokio::test]
    async fn round_trips_snapshot() {
        let repo = InMemoryRepository::new();
        let learner = LearnerId::new("anna").unwrap();

        let mut history = ReviewHistoryStore::new();
        let lesson = LessonId::new("A").unwrap();
        history.update(&lesson, QuestionIndex::new(0), ReviewOutcome::correct(1), fixed_now());
        let mut profile = LearnerProfile::new();
        profile.record_correct();
        let snapshot = Snapshot::new(profile, history);

        repo.save_progress(&learner, &snapshot, fixed_now())
            .await
            .unwrap();

        let loaded = repo.load_progress(&learner).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(repo.saved_at(&learner).unwrap(), Some(fixed_now()));
    }
}
