use sqlx::Row;

use vocab_core::model::{AchievementSet, LearnerId};

use crate::document::{ProgressDocument, parse_achievements};
use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Decode the progress document stored in a `learner_progress` row.
pub(crate) fn map_progress_row(
    learner: &LearnerId,
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressDocument, StorageError> {
    let document: String = row.try_get("document").map_err(ser)?;
    ProgressDocument::from_json(document.as_bytes())
        .map_err(|err| StorageError::corrupt(learner, err))
}

/// Collect badge ids from `learner_achievements` rows.
pub(crate) fn map_achievement_rows(
    learner: &LearnerId,
    rows: &[sqlx::sqlite::SqliteRow],
) -> Result<AchievementSet, StorageError> {
    let ids = rows
        .iter()
        .map(|row| row.try_get::<String, _>("badge").map_err(ser))
        .collect::<Result<Vec<_>, _>>()?;
    parse_achievements(ids.iter().map(String::as_str))
        .map_err(|err| StorageError::corrupt(learner, err))
}
