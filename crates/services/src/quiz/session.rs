use std::collections::BTreeSet;

use vocab_core::ReviewHistoryStore;
use vocab_core::model::{LearnerId, LearnerProfile, Lesson, LessonId, QuestionIndex, Snapshot};

use crate::error::SessionError;

//
// ─── CURRENT QUESTION ──────────────────────────────────────────────────────────
//

/// The question currently put to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentQuestion {
    pub index: QuestionIndex,
    /// Answers submitted for this question so far.
    pub submissions: u32,
    /// Set once a submission was judged correct.
    pub resolved: bool,
}

impl CurrentQuestion {
    fn new(index: QuestionIndex) -> Self {
        Self {
            index,
            submissions: 0,
            resolved: false,
        }
    }
}

//
// ─── ACTIVE LESSON ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
pub(crate) struct ActiveLesson {
    pub(crate) id: LessonId,
    pub(crate) lesson: Lesson,
    pub(crate) indices: Vec<QuestionIndex>,
    /// Questions answered correctly during the current pass.
    pub(crate) passed: BTreeSet<QuestionIndex>,
    pub(crate) current: Option<CurrentQuestion>,
}

impl ActiveLesson {
    fn new(id: LessonId, lesson: Lesson) -> Self {
        let indices = lesson.indices().collect();
        Self {
            id,
            lesson,
            indices,
            passed: BTreeSet::new(),
            current: None,
        }
    }

    /// Marks `index` passed. Returns `true` when that completes the pass,
    /// in which case a new pass starts.
    pub(crate) fn mark_passed(&mut self, index: QuestionIndex) -> bool {
        self.passed.insert(index);
        if self.passed.len() == self.indices.len() {
            self.passed.clear();
            true
        } else {
            false
        }
    }

    fn restart_pass(&mut self) {
        self.passed.clear();
        self.current = None;
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Everything one learner's quiz needs between events.
///
/// Handlers on `QuizService` take the session by `&mut`; the session
/// itself does no I/O.
#[derive(Debug, Clone)]
pub struct QuizSession {
    learner: LearnerId,
    snapshot: Snapshot,
    active: Option<ActiveLesson>,
}

impl QuizSession {
    #[must_use]
    pub fn new(learner: LearnerId, snapshot: Snapshot) -> Self {
        Self {
            learner,
            snapshot,
            active: None,
        }
    }

    #[must_use]
    pub fn learner(&self) -> &LearnerId {
        &self.learner
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn profile(&self) -> &LearnerProfile {
        &self.snapshot.profile
    }

    #[must_use]
    pub fn history(&self) -> &ReviewHistoryStore {
        &self.snapshot.history
    }

    #[must_use]
    pub fn lesson_id(&self) -> Option<&LessonId> {
        self.active.as_ref().map(|active| &active.id)
    }

    #[must_use]
    pub fn lesson(&self) -> Option<&Lesson> {
        self.active.as_ref().map(|active| &active.lesson)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<CurrentQuestion> {
        self.active.as_ref().and_then(|active| active.current)
    }

    /// `(passed, total)` for the current pass through the lesson.
    #[must_use]
    pub fn pass_progress(&self) -> Option<(usize, usize)> {
        self.active
            .as_ref()
            .map(|active| (active.passed.len(), active.indices.len()))
    }

    pub(crate) fn snapshot_mut(&mut self) -> &mut Snapshot {
        &mut self.snapshot
    }

    pub(crate) fn active_mut(&mut self) -> Result<&mut ActiveLesson, SessionError> {
        self.active.as_mut().ok_or(SessionError::NoLessonSelected)
    }

    /// Split borrow for handlers that touch both the lesson state and the
    /// snapshot.
    pub(crate) fn parts_mut(
        &mut self,
    ) -> Result<(&mut ActiveLesson, &mut Snapshot), SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NoLessonSelected)?;
        Ok((active, &mut self.snapshot))
    }

    pub(crate) fn activate(&mut self, id: LessonId, lesson: Lesson) {
        self.active = Some(ActiveLesson::new(id, lesson));
    }

    pub(crate) fn restart_pass(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.restart_pass();
        }
    }

    pub(crate) fn set_current(&mut self, index: QuestionIndex) -> Result<(), SessionError> {
        self.active_mut()?.current = Some(CurrentQuestion::new(index));
        Ok(())
    }
}
