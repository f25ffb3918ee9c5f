//! Persisted shapes for learner progress and achievements.
//!
//! These mirror the on-disk JSON documents so adapters can serialize and
//! deserialize without leaking storage concerns into the domain layer.
//! Converting a document back into domain types validates every record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vocab_core::ReviewHistoryStore;
use vocab_core::model::{
    AchievementSet, Badge, IdError, LearnerProfile, LessonId, QuestionIndex, QuestionRecord,
    ReviewError, Snapshot, UnknownBadge,
};

/// Reasons a stored document cannot be turned back into a snapshot.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid key: {0}")]
    Key(#[from] IdError),

    #[error("invalid record for lesson {lesson} question {index}: {source}")]
    Record {
        lesson: String,
        index: String,
        #[source]
        source: ReviewError,
    },

    #[error(transparent)]
    Badge(#[from] UnknownBadge),
}

/// History of one question as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDocument {
    pub last_seen: Option<DateTime<Utc>>,
    pub correct_count: u32,
    pub total_count: u32,
    pub easiness_factor: f64,
    pub interval: u32,
    #[serde(default)]
    pub attempts: Vec<u32>,
}

impl RecordDocument {
    #[must_use]
    pub fn from_record(record: &QuestionRecord) -> Self {
        Self {
            last_seen: record.last_seen(),
            correct_count: record.correct_count(),
            total_count: record.total_count(),
            easiness_factor: record.easiness_factor(),
            interval: record.interval_days(),
            attempts: record.attempts().to_vec(),
        }
    }

    /// # Errors
    ///
    /// Returns `ReviewError` if the stored values break record invariants.
    pub fn into_record(self) -> Result<QuestionRecord, ReviewError> {
        QuestionRecord::from_persisted(
            self.last_seen,
            self.correct_count,
            self.total_count,
            self.easiness_factor,
            self.interval,
            self.attempts,
        )
    }
}

/// `lesson id -> question index -> record`, with ids as strings.
pub type HistoryDocument = BTreeMap<String, BTreeMap<String, RecordDocument>>;

/// Per-learner progress document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressDocument {
    pub score: u32,
    pub streak: u32,
    pub lessons_completed: u32,
    #[serde(default)]
    pub question_history: HistoryDocument,
    pub timestamp: DateTime<Utc>,
}

impl ProgressDocument {
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot, saved_at: DateTime<Utc>) -> Self {
        let mut question_history = HistoryDocument::new();
        for (lesson_id, index, record) in snapshot.history.iter() {
            question_history
                .entry(lesson_id.to_string())
                .or_default()
                .insert(index.to_string(), RecordDocument::from_record(record));
        }

        Self {
            score: snapshot.profile.score(),
            streak: snapshot.profile.streak(),
            lessons_completed: snapshot.profile.lessons_completed(),
            question_history,
            timestamp: saved_at,
        }
    }

    /// Rebuild the domain snapshot, attaching the separately stored badges.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError` for invalid ids or records.
    pub fn into_snapshot(self, achievements: AchievementSet) -> Result<Snapshot, DocumentError> {
        let mut history = ReviewHistoryStore::new();
        for (lesson, questions) in self.question_history {
            let lesson_id: LessonId = lesson.parse()?;
            for (index, doc) in questions {
                let question_index: QuestionIndex = index.parse()?;
                let record = doc.into_record().map_err(|source| DocumentError::Record {
                    lesson: lesson.clone(),
                    index: index.clone(),
                    source,
                })?;
                history.insert(lesson_id.clone(), question_index, record);
            }
        }

        let profile = LearnerProfile::from_persisted(
            self.score,
            self.streak,
            self.lessons_completed,
            achievements,
        );
        Ok(Snapshot::new(profile, history))
    }

    /// # Errors
    ///
    /// Returns `DocumentError::Json` if the bytes are not a progress document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Badge id -> unlock description.
pub type AchievementsDocument = BTreeMap<String, String>;

#[must_use]
pub fn achievements_document(achievements: &AchievementSet) -> AchievementsDocument {
    achievements
        .iter()
        .map(|badge| (badge.id().to_owned(), badge.description().to_owned()))
        .collect()
}

/// # Errors
///
/// Returns `DocumentError::Badge` for an id no rule knows about.
pub fn parse_achievements<'a, I>(ids: I) -> Result<AchievementSet, DocumentError>
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter()
        .map(|id| id.parse::<Badge>().map_err(DocumentError::from))
        .collect()
}
