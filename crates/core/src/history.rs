use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};

use crate::model::{LessonId, QuestionIndex, QuestionRecord, ReviewOutcome};
use crate::scheduler;

/// In-memory table of learning records for one learner, keyed by
/// lesson and question index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewHistoryStore {
    records: BTreeMap<(LessonId, QuestionIndex), QuestionRecord>,
}

impl ReviewHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for a question, created with defaults if it does not exist yet.
    pub fn get(&mut self, lesson_id: &LessonId, index: QuestionIndex) -> &QuestionRecord {
        self.records
            .entry((lesson_id.clone(), index))
            .or_default()
    }

    /// Record for a question without creating it.
    #[must_use]
    pub fn find(&self, lesson_id: &LessonId, index: QuestionIndex) -> Option<&QuestionRecord> {
        self.records.get(&(lesson_id.clone(), index))
    }

    /// Create default records for every question of a lesson that has none.
    pub fn seed_lesson(&mut self, lesson_id: &LessonId, question_count: u32) {
        for index in (0..question_count).map(QuestionIndex::new) {
            if let Entry::Vacant(slot) = self.records.entry((lesson_id.clone(), index)) {
                slot.insert(QuestionRecord::default());
            }
        }
    }

    /// Apply a resolved review to a question and return the updated record.
    ///
    /// Each resolved question must be reported exactly once.
    pub fn update(
        &mut self,
        lesson_id: &LessonId,
        index: QuestionIndex,
        outcome: ReviewOutcome,
        reviewed_at: DateTime<Utc>,
    ) -> &QuestionRecord {
        let record = self
            .records
            .entry((lesson_id.clone(), index))
            .or_default();
        scheduler::apply_review(record, outcome, reviewed_at);
        record
    }

    /// Store a rehydrated record, replacing any existing one.
    pub fn insert(&mut self, lesson_id: LessonId, index: QuestionIndex, record: QuestionRecord) {
        self.records.insert((lesson_id, index), record);
    }

    /// Fold another table into this one. Records from `other` win.
    pub fn merge(&mut self, other: ReviewHistoryStore) {
        self.records.extend(other.records);
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by lesson, then question index.
    pub fn iter(&self) -> impl Iterator<Item = (&LessonId, QuestionIndex, &QuestionRecord)> {
        self.records
            .iter()
            .map(|((lesson_id, index), record)| (lesson_id, *index, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn lesson(id: &str) -> LessonId {
        LessonId::new(id).unwrap()
    }

    #[test]
    fn get_creates_default_record() {
        let mut store = ReviewHistoryStore::new();
        assert!(store.find(&lesson("A"), QuestionIndex::new(0)).is_none());

        let record = store.get(&lesson("A"), QuestionIndex::new(0)).clone();
        assert_eq!(record, QuestionRecord::default());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn seed_lesson_keeps_existing_records() {
        let mut store = ReviewHistoryStore::new();
        store.update(&lesson("A"), QuestionIndex::new(1), ReviewOutcome::correct(1), fixed_now());

        store.seed_lesson(&lesson("A"), 3);
        assert_eq!(store.len(), 3);
        assert_eq!(
            store
                .find(&lesson("A"), QuestionIndex::new(1))
                .unwrap()
                .correct_count(),
            1
        );
        assert!(store.find(&lesson("A"), QuestionIndex::new(2)).unwrap().is_new());
    }

    #[test]
    fn update_records_attempts_and_counts() {
        let mut store = ReviewHistoryStore::new();
        let a = lesson("A");
        store.update(&a, QuestionIndex::new(0), ReviewOutcome::incorrect(3), fixed_now());
        let record = store.update(&a, QuestionIndex::new(0), ReviewOutcome::correct(2), fixed_now());

        assert_eq!(record.total_count(), 2);
        assert_eq!(record.correct_count(), 1);
        assert_eq!(record.attempts(), &[3, 2]);
    }

    #[test]
    fn updating_twice_double_counts() {
        let mut store = ReviewHistoryStore::new();
        let a = lesson("A");
        store.update(&a, QuestionIndex::new(0), ReviewOutcome::correct(1), fixed_now());
        store.update(&a, QuestionIndex::new(0), ReviewOutcome::correct(1), fixed_now());
        assert_eq!(store.find(&a, QuestionIndex::new(0)).unwrap().total_count(), 2);
    }

    #[test]
    fn merge_prefers_incoming_records() {
        let mut live = ReviewHistoryStore::new();
        live.seed_lesson(&lesson("A"), 2);

        let mut persisted = ReviewHistoryStore::new();
        persisted.update(&lesson("A"), QuestionIndex::new(0), ReviewOutcome::correct(1), fixed_now());
        persisted.seed_lesson(&lesson("B"), 1);

        live.merge(persisted);
        assert_eq!(live.len(), 3);
        assert_eq!(
            live.find(&lesson("A"), QuestionIndex::new(0))
                .unwrap()
                .interval_days(),
            6
        );
    }

    #[test]
    fn clear_drops_everything() {
        let mut store = ReviewHistoryStore::new();
        store.seed_lesson(&lesson("A"), 5);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn iter_is_ordered_by_lesson_then_index() {
        let mut store = ReviewHistoryStore::new();
        store.seed_lesson(&lesson("B"), 1);
        store.seed_lesson(&lesson("A"), 2);
        let keys: Vec<_> = store
            .iter()
            .map(|(lesson_id, index, _)| (lesson_id.as_str().to_owned(), index.value()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A".to_owned(), 0_u32),
                ("A".to_owned(), 1),
                ("B".to_owned(), 0)
            ]
        );
    }
}
