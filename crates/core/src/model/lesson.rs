use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::model::ids::{LessonId, QuestionIndex};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("question answer cannot be empty")]
    EmptyAnswer,

    #[error("lesson has too many questions: {len}")]
    TooManyQuestions { len: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in lesson content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionDraft {
    pub prompt: String,
    pub answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// # Errors
    ///
    /// Returns `LessonError::EmptyAnswer` if the answer is blank.
    pub fn validate(self) -> Result<Question, LessonError> {
        if self.answer.trim().is_empty() {
            return Err(LessonError::EmptyAnswer);
        }
        Ok(Question {
            prompt: self.prompt,
            answer: self.answer,
            explanation: self.explanation.filter(|text| !text.trim().is_empty()),
        })
    }
}

/// A prompt and its expected answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "QuestionDraft")]
pub struct Question {
    prompt: String,
    answer: String,
    explanation: Option<String>,
}

impl TryFrom<QuestionDraft> for Question {
    type Error = LessonError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl Question {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// Lesson as it appears in lesson content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LessonDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

/// Ordered question set of one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "LessonDraft")]
pub struct Lesson {
    title: Option<String>,
    description: Option<String>,
    questions: Vec<Question>,
}

impl TryFrom<LessonDraft> for Lesson {
    type Error = LessonError;

    fn try_from(draft: LessonDraft) -> Result<Self, Self::Error> {
        Lesson::new(draft.title, draft.description, draft.questions)
    }
}

impl Lesson {
    /// # Errors
    ///
    /// Returns `LessonError::TooManyQuestions` if indices would not fit a
    /// `QuestionIndex`.
    pub fn new(
        title: Option<String>,
        description: Option<String>,
        questions: Vec<Question>,
    ) -> Result<Self, LessonError> {
        if u32::try_from(questions.len()).is_err() {
            return Err(LessonError::TooManyQuestions {
                len: questions.len(),
            });
        }
        Ok(Self {
            title,
            description,
            questions,
        })
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: QuestionIndex) -> Option<&Question> {
        self.questions.get(index.as_usize())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// All question indices of this lesson, in order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn indices(&self) -> impl Iterator<Item = QuestionIndex> + '_ {
        // `new` guarantees the length fits in u32.
        (0..self.questions.len() as u32).map(QuestionIndex::new)
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// All lessons available to the learner, keyed by lesson id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LessonCatalog(BTreeMap<LessonId, Lesson>);

impl LessonCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: LessonId, lesson: Lesson) {
        self.0.insert(id, lesson);
    }

    #[must_use]
    pub fn get(&self, id: &LessonId) -> Option<&Lesson> {
        self.0.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &LessonId> {
        self.0.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(prompt: &str, answer: &str) -> Question {
        QuestionDraft {
            prompt: prompt.into(),
            answer: answer.into(),
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn blank_answer_is_rejected() {
        let err = QuestionDraft {
            prompt: "dog".into(),
            answer: "  ".into(),
            explanation: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, LessonError::EmptyAnswer);
    }

    #[test]
    fn indices_cover_every_question() {
        let lesson = Lesson::new(
            None,
            None,
            vec![question("dog", "der Hund"), question("cat", "die Katze")],
        )
        .unwrap();
        let indices: Vec<_> = lesson.indices().collect();
        assert_eq!(indices, vec![QuestionIndex::new(0), QuestionIndex::new(1)]);
        assert_eq!(
            lesson.question(QuestionIndex::new(1)).unwrap().answer(),
            "die Katze"
        );
        assert!(lesson.question(QuestionIndex::new(2)).is_none());
    }

    #[test]
    fn catalog_parses_lesson_content() {
        let raw = r#"{
            "A": {
                "title": "Animals",
                "questions": [
                    {"prompt": "dog", "answer": "der Hund", "explanation": "masculine"},
                    {"prompt": "cat", "answer": "die Katze"}
                ]
            },
            "B": {"questions": []}
        }"#;
        let catalog: LessonCatalog = serde_json::from_str(raw).unwrap();
        assert_eq!(catalog.len(), 2);

        let lesson = catalog.get(&LessonId::new("A").unwrap()).unwrap();
        assert_eq!(lesson.title(), Some("Animals"));
        assert_eq!(lesson.questions()[0].explanation(), Some("masculine"));
        assert!(catalog.get(&LessonId::new("B").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn catalog_rejects_empty_answer() {
        let raw = r#"{"A": {"questions": [{"prompt": "dog", "answer": ""}]}}"#;
        assert!(serde_json::from_str::<LessonCatalog>(raw).is_err());
    }
}
