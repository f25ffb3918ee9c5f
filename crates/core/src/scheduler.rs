use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::history::ReviewHistoryStore;
use crate::model::{LessonId, MIN_EASINESS_FACTOR, QuestionIndex, QuestionRecord, ReviewOutcome};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchedulerError {
    #[error("lesson {lesson} has no questions to select from")]
    EmptyLesson { lesson: LessonId },
}

//
// ─── REVIEW RULE ───────────────────────────────────────────────────────────────
//

/// Easiness penalty applied when a question is abandoned or missed.
const INCORRECT_EASINESS_PENALTY: f64 = 0.2;

/// Interval a correct review moves a fresh question to.
const SECOND_INTERVAL_DAYS: u32 = 6;

/// Longest interval a correct review can grow to (about a century).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Apply a resolved review to a question record.
///
/// Correct reviews adjust the easiness factor by the number of attempts it
/// took, then step the interval: 1 day → 6 days, 6 days → 1 day, anything
/// else is multiplied by the new easiness factor. The 6 → 1 step means a
/// record that starts at the default interval keeps toggling between 1 and 6
/// days; that is the intended contract and is covered by tests.
///
/// Incorrect reviews lower the easiness factor by 0.2 and reset the interval
/// to one day. The easiness factor never drops below 1.3.
///
/// Calling this twice for the same review double counts it.
pub fn apply_review(record: &mut QuestionRecord, outcome: ReviewOutcome, reviewed_at: DateTime<Utc>) {
    record.last_seen = Some(reviewed_at);
    record.total_count = record.total_count.saturating_add(1);
    record.attempts.push(outcome.attempt_count());

    if outcome.was_correct() {
        record.correct_count = record.correct_count.saturating_add(1);
        record.easiness_factor =
            easiness_after_correct(record.easiness_factor, outcome.attempt_count());
        record.interval_days = interval_after_correct(record.interval_days, record.easiness_factor);
    } else {
        record.easiness_factor =
            (record.easiness_factor - INCORRECT_EASINESS_PENALTY).max(MIN_EASINESS_FACTOR);
        record.interval_days = 1;
    }
}

fn easiness_after_correct(easiness: f64, attempt_count: u32) -> f64 {
    let q = 5.0 - f64::from(attempt_count);
    let adjusted = easiness + (0.1 - q * (0.08 + q * 0.02));
    adjusted.max(MIN_EASINESS_FACTOR)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn interval_after_correct(interval_days: u32, easiness: f64) -> u32 {
    match interval_days {
        1 => SECOND_INTERVAL_DAYS,
        SECOND_INTERVAL_DAYS => 1,
        other => (f64::from(other) * easiness)
            .round()
            .clamp(1.0, f64::from(MAX_INTERVAL_DAYS.max(other))) as u32,
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Picks the next question of a lesson from its review history.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// When a record becomes eligible again: `last_seen + interval`, or `now`
    /// for a question that was never reviewed.
    ///
    /// A due date past the representable range saturates to
    /// `DateTime::<Utc>::MAX_UTC`, i.e. never due.
    #[must_use]
    pub fn next_due_date(record: &QuestionRecord, now: DateTime<Utc>) -> DateTime<Utc> {
        match record.last_seen() {
            Some(last_seen) => last_seen
                .checked_add_signed(Duration::days(i64::from(record.interval_days())))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            None => now,
        }
    }

    /// Indices whose due date is at or before `now`, in input order.
    ///
    /// Indices without a record count as never seen and are due.
    #[must_use]
    pub fn due_indices(
        &self,
        lesson_id: &LessonId,
        indices: &[QuestionIndex],
        history: &ReviewHistoryStore,
        now: DateTime<Utc>,
    ) -> Vec<QuestionIndex> {
        indices
            .iter()
            .copied()
            .filter(|index| match history.find(lesson_id, *index) {
                Some(record) => Self::next_due_date(record, now) <= now,
                None => true,
            })
            .collect()
    }

    /// Choose the next question to present.
    ///
    /// Picks uniformly among due questions; when nothing is due, picks
    /// uniformly among all of them so the learner always has something to
    /// review.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::EmptyLesson` if `indices` is empty.
    pub fn select_next<R: Rng + ?Sized>(
        &self,
        lesson_id: &LessonId,
        indices: &[QuestionIndex],
        history: &ReviewHistoryStore,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<QuestionIndex, SchedulerError> {
        let empty = || SchedulerError::EmptyLesson {
            lesson: lesson_id.clone(),
        };
        if indices.is_empty() {
            return Err(empty());
        }

        let due = self.due_indices(lesson_id, indices, history, now);
        let pool = if due.is_empty() { indices } else { due.as_slice() };
        pool.choose(rng).copied().ok_or_else(empty)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
