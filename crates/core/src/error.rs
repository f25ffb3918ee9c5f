use thiserror::Error;

use crate::model::{IdError, LessonError, ReviewError, UnknownBadge};
use crate::scheduler::SchedulerError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Badge(#[from] UnknownBadge),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonId, QuestionIndex, QuestionRecord};

    fn parse_key(lesson: &str, index: &str) -> Result<(LessonId, QuestionIndex), Error> {
        Ok((lesson.parse()?, index.parse()?))
    }

    #[test]
    fn model_errors_compose_with_question_mark() {
        assert!(parse_key("A", "3").is_ok());
        assert!(matches!(parse_key("A", "three"), Err(Error::Id(_))));

        let invalid = QuestionRecord::from_persisted(None, 0, 0, 0.5, 1, Vec::new())
            .map_err(Error::from)
            .unwrap_err();
        assert!(matches!(invalid, Error::Review(_)));
    }
}
