use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};

use vocab_core::achievements::AchievementEngine;
use vocab_core::answer::{self, Evaluation};
use vocab_core::model::{
    Badge, LearnerId, Lesson, LessonId, QuestionIndex, ReviewOutcome, Snapshot,
};
use vocab_core::scheduler::{Scheduler, SchedulerError};
use vocab_core::time::Clock;
use vocab_core::ReviewHistoryStore;
use storage::repository::ProgressRepository;

use super::session::QuizSession;
use crate::error::SessionError;

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// The question chosen by `on_next_requested`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextQuestion {
    pub index: QuestionIndex,
    pub prompt: String,
    /// The previous question, if it was left unanswered and counted as
    /// incorrect.
    pub abandoned: Option<QuestionIndex>,
}

/// Outcome of one submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub index: QuestionIndex,
    pub evaluation: Evaluation,
    /// Submissions made for this question, including this one.
    pub attempt: u32,
    pub score: u32,
    pub streak: u32,
    pub newly_unlocked: Vec<Badge>,
    /// Set when this answer finished a full pass through the lesson.
    pub lesson_completed: bool,
    /// Shown once the question is answered correctly.
    pub explanation: Option<String>,
    /// When the question is due again. Only set for correct answers.
    pub next_due: Option<DateTime<Utc>>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Drives quiz sessions: judging answers, scheduling questions, unlocking
/// badges and persisting the learner snapshot after every change.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    scheduler: Scheduler,
    engine: AchievementEngine,
    progress: Arc<dyn ProgressRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            scheduler: Scheduler::new(),
            engine: AchievementEngine::default(),
            progress,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: AchievementEngine) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Load the learner's stored progress, or start fresh if none exists.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if progress cannot be read, including
    /// stored progress that is corrupt.
    pub async fn open_session(&self, learner: LearnerId) -> Result<QuizSession, SessionError> {
        let snapshot = match self.progress.load_progress(&learner).await? {
            Some(snapshot) => {
                info!(
                    %learner,
                    score = snapshot.profile.score(),
                    records = snapshot.history.len(),
                    "resumed learner"
                );
                snapshot
            }
            None => {
                info!(%learner, "new learner");
                Snapshot::default()
            }
        };
        Ok(QuizSession::new(learner, snapshot))
    }

    /// Make `lesson` the active lesson and give every question a history
    /// record.
    ///
    /// A question still open in the previous lesson is abandoned first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Scheduler` for a lesson without questions, or
    /// `SessionError::Storage` if saving an abandoned question fails.
    pub async fn select_lesson(
        &self,
        session: &mut QuizSession,
        lesson_id: LessonId,
        lesson: Lesson,
    ) -> Result<(), SessionError> {
        if lesson.is_empty() {
            return Err(SchedulerError::EmptyLesson { lesson: lesson_id }.into());
        }

        if let Some(abandoned) = self.abandon_current(session) {
            debug!(index = %abandoned, "abandoned question on lesson switch");
            self.save_session(session).await?;
        }

        // Fresh records for the lesson, with anything already stored on top.
        let history = &mut session.snapshot_mut().history;
        let mut seeded = ReviewHistoryStore::new();
        seeded.seed_lesson(&lesson_id, question_count(&lesson));
        seeded.merge(std::mem::take(history));
        *history = seeded;

        info!(
            learner = %session.learner(),
            lesson = %lesson_id,
            questions = lesson.len(),
            "lesson selected"
        );
        session.activate(lesson_id, lesson);
        Ok(())
    }

    /// Move on to the next question chosen by the scheduler.
    ///
    /// An unanswered current question is recorded as incorrect, with at
    /// least one attempt, and saved before the next one is picked.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoLessonSelected` without an active lesson,
    /// or `SessionError::Storage` if saving fails.
    pub async fn on_next_requested<R: Rng + ?Sized>(
        &self,
        session: &mut QuizSession,
        rng: &mut R,
    ) -> Result<NextQuestion, SessionError> {
        session.active_mut()?;

        let abandoned = self.abandon_current(session);
        if abandoned.is_some() {
            self.save_session(session).await?;
        }

        let now = self.clock.now();
        let (index, prompt) = {
            let (active, snapshot) = session.parts_mut()?;
            let index = self.scheduler.select_next(
                &active.id,
                &active.indices,
                &snapshot.history,
                now,
                rng,
            )?;
            let question = active
                .lesson
                .question(index)
                .ok_or_else(|| SessionError::UnknownQuestion {
                    lesson: active.id.clone(),
                    index,
                })?;
            (index, question.prompt().to_owned())
        };
        session.set_current(index)?;

        debug!(learner = %session.learner(), %index, ?abandoned, "next question");
        Ok(NextQuestion {
            index,
            prompt,
            abandoned,
        })
    }

    /// Judge an answer to the current question.
    ///
    /// A correct answer resolves the question, updates its history and
    /// scores it. An incorrect one breaks the streak and leaves the question
    /// open for another try. Either way badges are re-evaluated and the
    /// snapshot is saved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoLessonSelected`, `NoActiveQuestion` or
    /// `AlreadyResolved` when there is nothing to answer, or
    /// `SessionError::Storage` if saving fails.
    pub async fn on_answer_submitted(
        &self,
        session: &mut QuizSession,
        submitted: &str,
    ) -> Result<AnswerFeedback, SessionError> {
        let now = self.clock.now();
        let feedback = {
            let (active, snapshot) = session.parts_mut()?;
            let current = active.current.as_mut().ok_or(SessionError::NoActiveQuestion)?;
            if current.resolved {
                return Err(SessionError::AlreadyResolved {
                    index: current.index,
                });
            }
            let index = current.index;
            let question = active
                .lesson
                .question(index)
                .ok_or_else(|| SessionError::UnknownQuestion {
                    lesson: active.id.clone(),
                    index,
                })?;

            current.submissions += 1;
            let attempt = current.submissions;
            let evaluation = answer::evaluate(submitted, question.answer());

            let mut explanation = None;
            let mut next_due = None;
            let mut lesson_completed = false;
            if evaluation.is_correct {
                current.resolved = true;
                explanation = question.explanation().map(ToOwned::to_owned);

                let record = snapshot.history.update(
                    &active.id,
                    index,
                    ReviewOutcome::correct(attempt),
                    now,
                );
                next_due = Some(Scheduler::next_due_date(record, now));
                snapshot.profile.record_correct();

                if active.mark_passed(index) {
                    snapshot.profile.record_lesson_completed();
                    lesson_completed = true;
                    info!(
                        lesson = %active.id,
                        completed = snapshot.profile.lessons_completed(),
                        "lesson pass completed"
                    );
                }
            } else {
                snapshot.profile.record_incorrect();
            }

            let update = self
                .engine
                .evaluate(&snapshot.profile, snapshot.profile.achievements());
            for badge in &update.newly_unlocked {
                info!(badge = badge.id(), "achievement unlocked");
            }
            snapshot.profile.set_achievements(update.achievements);

            debug!(
                lesson = %active.id,
                %index,
                attempt,
                correct = evaluation.is_correct,
                streak = snapshot.profile.streak(),
                "answer judged"
            );

            AnswerFeedback {
                index,
                evaluation,
                attempt,
                score: snapshot.profile.score(),
                streak: snapshot.profile.streak(),
                newly_unlocked: update.newly_unlocked,
                lesson_completed,
                explanation,
                next_due,
            }
        };

        self.save_session(session).await?;
        Ok(feedback)
    }

    /// Forget all progress except unlocked badges and save the result.
    ///
    /// The active lesson stays selected, with fresh records and a new pass.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if saving fails.
    pub async fn on_reset_requested(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        let reseed = session
            .lesson()
            .map(question_count)
            .zip(session.lesson_id().cloned());

        let snapshot = session.snapshot_mut();
        snapshot.history.clear();
        snapshot.profile.reset_progress();
        if let Some((count, lesson_id)) = reseed {
            snapshot.history.seed_lesson(&lesson_id, count);
        }
        session.restart_pass();

        info!(learner = %session.learner(), "progress reset");
        self.save_session(session).await
    }

    /// Record the open question, if any, as an incorrect review.
    fn abandon_current(&self, session: &mut QuizSession) -> Option<QuestionIndex> {
        let now = self.clock.now();
        let (active, snapshot) = session.parts_mut().ok()?;
        let current = active.current.take()?;
        if current.resolved {
            return None;
        }

        snapshot.history.update(
            &active.id,
            current.index,
            ReviewOutcome::incorrect(current.submissions),
            now,
        );
        Some(current.index)
    }

    /// Store the session's current snapshot.
    ///
    /// Handlers call this after every change. When one of them returns a
    /// storage error the in-memory session has already moved on, so calling
    /// this again is how the caller retries.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if saving fails.
    pub async fn save_session(&self, session: &QuizSession) -> Result<(), SessionError> {
        self.progress
            .save_progress(session.learner(), session.snapshot(), self.clock.now())
            .await?;
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn question_count(lesson: &Lesson) -> u32 {
    // `Lesson::new` guarantees the length fits in u32.
    lesson.len() as u32
}
