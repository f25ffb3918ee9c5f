use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use vocab_core::model::{LearnerId, Snapshot};

use super::{
    SqliteRepository,
    mapping::{map_achievement_rows, map_progress_row},
};
use crate::document::ProgressDocument;
use crate::repository::{ProgressRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self, learner: &LearnerId) -> Result<Option<Snapshot>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT document
                FROM learner_progress
                WHERE learner_id = ?1
            ",
        )
        .bind(learner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            debug!(%learner, "no stored progress");
            return Ok(None);
        };
        let document = map_progress_row(learner, &row)?;

        let badge_rows = sqlx::query(
            r"
                SELECT badge
                FROM learner_achievements
                WHERE learner_id = ?1
                ORDER BY badge ASC
            ",
        )
        .bind(learner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        let achievements = map_achievement_rows(learner, &badge_rows)?;

        let snapshot = document.into_snapshot(achievements).map_err(|err| {
            warn!(%learner, error = %err, "stored progress is corrupt");
            StorageError::corrupt(learner, err)
        })?;
        Ok(Some(snapshot))
    }

    async fn save_progress(
        &self,
        learner: &LearnerId,
        snapshot: &Snapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let document = ProgressDocument::from_snapshot(snapshot, saved_at)
            .to_json()
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO learner_progress (learner_id, document, saved_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(learner_id) DO UPDATE SET
                    document = excluded.document,
                    saved_at = excluded.saved_at
            ",
        )
        .bind(learner.as_str())
        .bind(&document)
        .bind(saved_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // Badges only ever get added; an already stored badge keeps its
        // first unlock time.
        for badge in snapshot.profile.achievements().iter() {
            sqlx::query(
                r"
                    INSERT INTO learner_achievements (learner_id, badge, description, unlocked_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(learner_id, badge) DO NOTHING
                ",
            )
            .bind(learner.as_str())
            .bind(badge.id())
            .bind(badge.description())
            .bind(saved_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        debug!(%learner, "saved progress");
        Ok(())
    }
}
