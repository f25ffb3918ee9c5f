use crate::model::{AchievementSet, Badge, LearnerProfile};

/// Which profile stat a rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Score,
    Streak,
    LessonsCompleted,
}

impl Metric {
    fn read(self, profile: &LearnerProfile) -> u32 {
        match self {
            Metric::Score => profile.score(),
            Metric::Streak => profile.streak(),
            Metric::LessonsCompleted => profile.lessons_completed(),
        }
    }
}

/// Unlock `badge` once `metric` reaches `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementRule {
    pub metric: Metric,
    pub threshold: u32,
    pub badge: Badge,
}

impl AchievementRule {
    #[must_use]
    pub fn is_met(&self, profile: &LearnerProfile) -> bool {
        self.metric.read(profile) >= self.threshold
    }
}

pub const DEFAULT_RULES: [AchievementRule; 6] = [
    AchievementRule {
        metric: Metric::Score,
        threshold: 100,
        badge: Badge::PointCollector,
    },
    AchievementRule {
        metric: Metric::Score,
        threshold: 500,
        badge: Badge::PointProfessional,
    },
    AchievementRule {
        metric: Metric::Streak,
        threshold: 5,
        badge: Badge::Diligent,
    },
    AchievementRule {
        metric: Metric::Streak,
        threshold: 10,
        badge: Badge::StreakMaster,
    },
    AchievementRule {
        metric: Metric::LessonsCompleted,
        threshold: 1,
        badge: Badge::Beginner,
    },
    AchievementRule {
        metric: Metric::LessonsCompleted,
        threshold: 5,
        badge: Badge::DedicatedStudent,
    },
];

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementUpdate {
    /// Badges unlocked by this pass, in rule order.
    pub newly_unlocked: Vec<Badge>,
    pub achievements: AchievementSet,
}

/// Evaluates a rule table against learner stats.
#[derive(Debug, Clone)]
pub struct AchievementEngine {
    rules: Vec<AchievementRule>,
}

impl Default for AchievementEngine {
    fn default() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec())
    }
}

impl AchievementEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rules(rules: Vec<AchievementRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[AchievementRule] {
        &self.rules
    }

    /// Unlock every badge whose rule is met and that is not already in
    /// `already_unlocked`. All matching rules fire in the same pass.
    #[must_use]
    pub fn evaluate(
        &self,
        profile: &LearnerProfile,
        already_unlocked: &AchievementSet,
    ) -> AchievementUpdate {
        let mut achievements = already_unlocked.clone();
        let newly_unlocked = self
            .rules
            .iter()
            .filter(|rule| rule.is_met(profile))
            .filter_map(|rule| achievements.unlock(rule.badge).then_some(rule.badge))
            .collect();

        AchievementUpdate {
            newly_unlocked,
            achievements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(score: u32, streak: u32, lessons: u32) -> LearnerProfile {
        LearnerProfile::from_persisted(score, streak, lessons, AchievementSet::new())
    }

    #[test]
    fn nothing_unlocks_for_a_new_learner() {
        let update = AchievementEngine::new().evaluate(&profile(0, 0, 0), &AchievementSet::new());
        assert!(update.newly_unlocked.is_empty());
        assert!(update.achievements.is_empty());
    }

    #[test]
    fn all_applicable_rules_fire_together() {
        let update =
            AchievementEngine::new().evaluate(&profile(500, 10, 5), &AchievementSet::new());
        assert_eq!(update.newly_unlocked, Badge::ALL.to_vec());
        assert_eq!(update.achievements.len(), 6);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let update = AchievementEngine::new().evaluate(&profile(100, 5, 1), &AchievementSet::new());
        assert_eq!(
            update.newly_unlocked,
            vec![Badge::PointCollector, Badge::Diligent, Badge::Beginner]
        );

        let update = AchievementEngine::new().evaluate(&profile(99, 4, 0), &AchievementSet::new());
        assert!(update.newly_unlocked.is_empty());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let engine = AchievementEngine::new();
        let stats = profile(120, 6, 0);

        let first = engine.evaluate(&stats, &AchievementSet::new());
        assert_eq!(first.newly_unlocked, vec![Badge::PointCollector, Badge::Diligent]);

        let second = engine.evaluate(&stats, &first.achievements);
        assert!(second.newly_unlocked.is_empty());
        assert_eq!(second.achievements, first.achievements);
    }

    #[test]
    fn previously_unlocked_badges_are_kept_when_stats_drop() {
        let unlocked: AchievementSet = [Badge::StreakMaster].into_iter().collect();
        let update = AchievementEngine::new().evaluate(&profile(0, 0, 0), &unlocked);
        assert!(update.achievements.contains(Badge::StreakMaster));
    }

    #[test]
    fn custom_rules_extend_the_table() {
        let mut rules = DEFAULT_RULES.to_vec();
        rules.retain(|rule| rule.metric == Metric::Score);
        let engine = AchievementEngine::with_rules(rules);
        let update = engine.evaluate(&profile(600, 20, 9), &AchievementSet::new());
        assert_eq!(
            update.newly_unlocked,
            vec![Badge::PointCollector, Badge::PointProfessional]
        );
    }
}
