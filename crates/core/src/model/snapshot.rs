use crate::history::ReviewHistoryStore;
use crate::model::LearnerProfile;

/// Everything persisted for one learner: aggregate stats plus the full
/// question history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub profile: LearnerProfile,
    pub history: ReviewHistoryStore,
}

impl Snapshot {
    #[must_use]
    pub fn new(profile: LearnerProfile, history: ReviewHistoryStore) -> Self {
        Self { profile, history }
    }
}
