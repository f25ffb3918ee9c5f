use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Points awarded for each correct answer.
pub const SCORE_PER_CORRECT: u32 = 10;

//
// ─── BADGES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown badge identifier: {0}")]
pub struct UnknownBadge(pub String);

/// Achievement badges a learner can unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Badge {
    PointCollector,
    PointProfessional,
    Diligent,
    StreakMaster,
    Beginner,
    DedicatedStudent,
}

impl Badge {
    pub const ALL: [Badge; 6] = [
        Badge::PointCollector,
        Badge::PointProfessional,
        Badge::Diligent,
        Badge::StreakMaster,
        Badge::Beginner,
        Badge::DedicatedStudent,
    ];

    /// Stable identifier used in persisted achievement documents.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Badge::PointCollector => "point-collector",
            Badge::PointProfessional => "point-professional",
            Badge::Diligent => "diligent",
            Badge::StreakMaster => "streak-master",
            Badge::Beginner => "beginner",
            Badge::DedicatedStudent => "dedicated-student",
        }
    }

    /// Human-readable unlock description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Badge::PointCollector => "Earned 100 points",
            Badge::PointProfessional => "Earned 500 points",
            Badge::Diligent => "Answered 5 questions correctly in a row",
            Badge::StreakMaster => "Answered 10 questions correctly in a row",
            Badge::Beginner => "Completed your first lesson",
            Badge::DedicatedStudent => "Completed 5 lessons",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Badge {
    type Err = UnknownBadge;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Badge::ALL
            .into_iter()
            .find(|badge| badge.id() == s)
            .ok_or_else(|| UnknownBadge(s.to_owned()))
    }
}

/// Set of unlocked badges. Only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementSet(BTreeSet<Badge>);

impl AchievementSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a badge; returns `false` if it was already unlocked.
    pub fn unlock(&mut self, badge: Badge) -> bool {
        self.0.insert(badge)
    }

    #[must_use]
    pub fn contains(&self, badge: Badge) -> bool {
        self.0.contains(&badge)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Badge> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Badge> for AchievementSet {
    fn from_iter<T: IntoIterator<Item = Badge>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// Aggregate stats of a learner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerProfile {
    score: u32,
    streak: u32,
    lessons_completed: u32,
    achievements: AchievementSet,
}

impl LearnerProfile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_persisted(
        score: u32,
        streak: u32,
        lessons_completed: u32,
        achievements: AchievementSet,
    ) -> Self {
        Self {
            score,
            streak,
            lessons_completed,
            achievements,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn lessons_completed(&self) -> u32 {
        self.lessons_completed
    }

    #[must_use]
    pub fn achievements(&self) -> &AchievementSet {
        &self.achievements
    }

    pub fn record_correct(&mut self) {
        self.score = self.score.saturating_add(SCORE_PER_CORRECT);
        self.streak = self.streak.saturating_add(1);
    }

    pub fn record_incorrect(&mut self) {
        self.streak = 0;
    }

    pub fn record_lesson_completed(&mut self) {
        self.lessons_completed = self.lessons_completed.saturating_add(1);
    }

    pub fn set_achievements(&mut self, achievements: AchievementSet) {
        self.achievements = achievements;
    }

    /// Zero the counters. Unlocked badges are kept.
    pub fn reset_progress(&mut self) {
        self.score = 0;
        self.streak = 0;
        self.lessons_completed = 0;
    }
}
