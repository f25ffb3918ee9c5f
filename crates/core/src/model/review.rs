use chrono::{DateTime, Utc};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when building review data.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ReviewError {
    #[error("attempt count must be at least 1")]
    ZeroAttempts,

    #[error("correct count ({correct}) exceeds total count ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("easiness factor must be a finite value >= {min}, got {provided}")]
    InvalidEasiness { provided: f64, min: f64 },

    #[error("interval must be at least 1 day")]
    ZeroInterval,

    #[error("attempt history has {len} entries but total count is {total}")]
    AttemptHistoryMismatch { len: usize, total: u32 },
}

//
// ─── CONSTANTS ────────────────────────────────────────────────────────────────
//

/// Lower bound of the easiness factor.
pub const MIN_EASINESS_FACTOR: f64 = 1.3;

/// Easiness factor of a question that has never been reviewed.
pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;

/// Interval (days) of a question that has never been reviewed.
pub const DEFAULT_INTERVAL_DAYS: u32 = 1;

//
// ─── REVIEW OUTCOME ───────────────────────────────────────────────────────────
//

/// How a single question was resolved: judged correct or abandoned, and after
/// how many submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewOutcome {
    was_correct: bool,
    attempt_count: u32,
}

impl ReviewOutcome {
    /// # Errors
    ///
    /// Returns `ReviewError::ZeroAttempts` when `attempt_count` is 0.
    pub fn new(was_correct: bool, attempt_count: u32) -> Result<Self, ReviewError> {
        if attempt_count == 0 {
            return Err(ReviewError::ZeroAttempts);
        }
        Ok(Self {
            was_correct,
            attempt_count,
        })
    }

    #[must_use]
    pub fn correct(attempt_count: u32) -> Self {
        Self {
            was_correct: true,
            attempt_count: attempt_count.max(1),
        }
    }

    #[must_use]
    pub fn incorrect(attempt_count: u32) -> Self {
        Self {
            was_correct: false,
            attempt_count: attempt_count.max(1),
        }
    }

    #[must_use]
    pub fn was_correct(&self) -> bool {
        self.was_correct
    }

    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }
}

//
// ─── QUESTION RECORD ──────────────────────────────────────────────────────────
//

/// Learning history of one question of one lesson.
///
/// Only the scheduler mutates a record; everything else reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    pub(crate) last_seen: Option<DateTime<Utc>>,
    pub(crate) correct_count: u32,
    pub(crate) total_count: u32,
    pub(crate) easiness_factor: f64,
    pub(crate) interval_days: u32,
    pub(crate) attempts: Vec<u32>,
}

impl Default for QuestionRecord {
    fn default() -> Self {
        Self {
            last_seen: None,
            correct_count: 0,
            total_count: 0,
            easiness_factor: DEFAULT_EASINESS_FACTOR,
            interval_days: DEFAULT_INTERVAL_DAYS,
            attempts: Vec::new(),
        }
    }
}

impl QuestionRecord {
    /// Rehydrate a record from persisted storage, enforcing its invariants.
    ///
    /// # Errors
    ///
    /// Returns a `ReviewError` describing the first violated invariant.
    pub fn from_persisted(
        last_seen: Option<DateTime<Utc>>,
        correct_count: u32,
        total_count: u32,
        easiness_factor: f64,
        interval_days: u32,
        attempts: Vec<u32>,
    ) -> Result<Self, ReviewError> {
        if correct_count > total_count {
            return Err(ReviewError::CorrectExceedsTotal {
                correct: correct_count,
                total: total_count,
            });
        }
        if !easiness_factor.is_finite() || easiness_factor < MIN_EASINESS_FACTOR {
            return Err(ReviewError::InvalidEasiness {
                provided: easiness_factor,
                min: MIN_EASINESS_FACTOR,
            });
        }
        if interval_days == 0 {
            return Err(ReviewError::ZeroInterval);
        }
        if attempts.contains(&0) {
            return Err(ReviewError::ZeroAttempts);
        }
        if attempts.len() != total_count as usize {
            return Err(ReviewError::AttemptHistoryMismatch {
                len: attempts.len(),
                total: total_count,
            });
        }

        Ok(Self {
            last_seen,
            correct_count,
            total_count,
            easiness_factor,
            interval_days,
            attempts,
        })
    }

    #[must_use]
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    #[must_use]
    pub fn easiness_factor(&self) -> f64 {
        self.easiness_factor
    }

    #[must_use]
    pub fn interval_days(&self) -> u32 {
        self.interval_days
    }

    #[must_use]
    pub fn attempts(&self) -> &[u32] {
        &self.attempts
    }

    /// True until the first resolved review.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.last_seen.is_none()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
