use vocab_core::ReviewHistoryStore;
use vocab_core::model::{
    AchievementSet, Badge, LearnerId, LearnerProfile, LessonId, QuestionIndex, ReviewOutcome,
    Snapshot,
};
use vocab_core::time::fixed_now;
use storage::repository::{ProgressRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn snapshot_with(score_events: u32, badges: &[Badge]) -> Snapshot {
    let lesson = LessonId::new("A").unwrap();
    let mut history = ReviewHistoryStore::new();
    history.seed_lesson(&lesson, 3);
    history.update(&lesson, QuestionIndex::new(1), ReviewOutcome::correct(2), fixed_now());

    let mut profile = LearnerProfile::new();
    for _ in 0..score_events {
        profile.record_correct();
    }
    profile.set_achievements(badges.iter().copied().collect::<AchievementSet>());
    Snapshot::new(profile, history)
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_missing_learner_is_none() {
    let repo = connect("memdb_missing").await;
    let learner = LearnerId::new("ghost").unwrap();
    assert!(repo.load_progress(&learner).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_roundtrip_restores_snapshot() {
    let repo = connect("memdb_roundtrip").await;
    let learner = LearnerId::new("anna").unwrap();
    let snapshot = snapshot_with(3, &[Badge::Beginner]);

    repo.save_progress(&learner, &snapshot, fixed_now())
        .await
        .unwrap();

    let loaded = repo.load_progress(&learner).await.unwrap().expect("stored");
    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.profile.score(), 30);
    assert!(loaded.profile.achievements().contains(Badge::Beginner));
}

#[tokio::test]
async fn sqlite_save_replaces_progress_and_accumulates_badges() {
    let repo = connect("memdb_replace").await;
    let learner = LearnerId::new("anna").unwrap();

    repo.save_progress(&learner, &snapshot_with(1, &[Badge::Beginner]), fixed_now())
        .await
        .unwrap();
    let newer = snapshot_with(10, &[Badge::Beginner, Badge::PointCollector]);
    repo.save_progress(&learner, &newer, fixed_now())
        .await
        .unwrap();

    let loaded = repo.load_progress(&learner).await.unwrap().unwrap();
    assert_eq!(loaded.profile.score(), 100);
    assert_eq!(loaded.profile.achievements().len(), 2);
}

#[tokio::test]
async fn sqlite_learners_are_isolated() {
    let repo = connect("memdb_isolated").await;
    let anna = LearnerId::new("anna").unwrap();
    let ben = LearnerId::new("ben").unwrap();

    repo.save_progress(&anna, &snapshot_with(2, &[]), fixed_now())
        .await
        .unwrap();

    assert!(repo.load_progress(&ben).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_corrupt_document_is_reported() {
    let repo = connect("memdb_corrupt").await;
    let learner = LearnerId::new("anna").unwrap();

    sqlx::query(
        "INSERT INTO learner_progress (learner_id, document, saved_at) VALUES (?1, ?2, ?3)",
    )
    .bind("anna")
    .bind("{\"score\": \"lots\"}")
    .bind(fixed_now())
    .execute(repo.pool())
    .await
    .unwrap();

    let err = repo.load_progress(&learner).await.unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}
