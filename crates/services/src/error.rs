//! Shared error types for the services crate.

use thiserror::Error;

use vocab_core::model::{LessonId, QuestionIndex};
use vocab_core::scheduler::SchedulerError;
use storage::repository::StorageError;

/// Errors emitted by the quiz session handlers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no lesson selected")]
    NoLessonSelected,
    #[error("no question is being asked")]
    NoActiveQuestion,
    #[error("question {index} was already answered correctly")]
    AlreadyResolved { index: QuestionIndex },
    #[error("lesson {lesson} has no question {index}")]
    UnknownQuestion {
        lesson: LessonId,
        index: QuestionIndex,
    },
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Stored progress exists but could not be read back.
    #[must_use]
    pub fn is_corrupt_state(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_corrupt())
    }
}
