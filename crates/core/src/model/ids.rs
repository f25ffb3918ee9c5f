use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when an identifier fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    #[error("learner id contains a path separator: {0}")]
    PathSeparator(String),

    #[error("failed to parse {kind} from {raw:?}")]
    Parse { kind: &'static str, raw: String },
}

/// Identity of a learner. Adapters key files and rows by it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LearnerId(String);

impl LearnerId {
    /// Creates a validated `LearnerId`. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` for blank input and `IdError::PathSeparator`
    /// when the id could escape a storage directory.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty { kind: "learner id" });
        }
        if trimmed.contains(['/', '\\']) || trimmed == ".." {
            return Err(IdError::PathSeparator(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity of a lesson inside a catalog.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LessonId(String);

impl LessonId {
    /// Creates a validated `LessonId`.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` for blank input.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty { kind: "lesson id" });
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Position of a question within its lesson.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionIndex(u32);

impl QuestionIndex {
    #[must_use]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Index usable against a question slice.
    #[must_use]
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

// ─── Conversions ───────────────────────────────────────────────────────────────

impl TryFrom<String> for LearnerId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LearnerId> for String {
    fn from(value: LearnerId) -> Self {
        value.0
    }
}

impl TryFrom<String> for LessonId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LessonId> for String {
    fn from(value: LessonId) -> Self {
        value.0
    }
}

impl fmt::Debug for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LearnerId({})", self.0)
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Debug for QuestionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionIndex({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for QuestionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

impl FromStr for LearnerId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for LessonId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for QuestionIndex {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(QuestionIndex::new)
            .map_err(|_| IdError::Parse {
                kind: "question index",
                raw: s.to_owned(),
            })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learner_id_is_trimmed() {
        let id = LearnerId::new("  anna ").unwrap();
        assert_eq!(id.as_str(), "anna");
        assert_eq!(id.to_string(), "anna");
    }

    #[test]
    fn learner_id_rejects_blank_and_paths() {
        assert!(matches!(
            LearnerId::new("   "),
            Err(IdError::Empty { .. })
        ));
        assert!(matches!(
            LearnerId::new("../etc"),
            Err(IdError::PathSeparator(_))
        ));
        assert!(LearnerId::new("..").is_err());
    }

    #[test]
    fn lesson_id_rejects_blank() {
        assert!("".parse::<LessonId>().is_err());
        assert_eq!("A".parse::<LessonId>().unwrap().as_str(), "A");
    }

    #[test]
    fn question_index_from_str() {
        let idx: QuestionIndex = "12".parse().unwrap();
        assert_eq!(idx, QuestionIndex::new(12));
        assert_eq!(idx.as_usize(), 12);
    }

    #[test]
    fn question_index_from_str_invalid() {
        let err = "-1".parse::<QuestionIndex>().unwrap_err();
        assert!(matches!(err, IdError::Parse { .. }));
    }

    #[test]
    fn learner_id_deserialize_validates() {
        let ok: LearnerId = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(ok.as_str(), "bob");
        assert!(serde_json::from_str::<LearnerId>("\"\"").is_err());
    }
}
