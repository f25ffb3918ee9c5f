mod ids;
mod lesson;
mod profile;
mod review;
mod snapshot;

pub use ids::{IdError, LearnerId, LessonId, QuestionIndex};
pub use lesson::{Lesson, LessonCatalog, LessonDraft, LessonError, Question, QuestionDraft};
pub use profile::{AchievementSet, Badge, LearnerProfile, SCORE_PER_CORRECT, UnknownBadge};
pub use review::{
    DEFAULT_EASINESS_FACTOR, DEFAULT_INTERVAL_DAYS, MIN_EASINESS_FACTOR, QuestionRecord,
    ReviewError, ReviewOutcome,
};
pub use snapshot::Snapshot;
