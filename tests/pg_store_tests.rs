// tests/pg_store_tests.rs
//
// Run against a disposable database:
//   DATABASE_URL=postgres://... cargo test --test pg_store_tests -- --ignored

use career_journey::{
    config::{Config, StorageBackend},
    error::AppError,
    models::{
        progress::Progress,
        quiz_result::{CareerAnswers, QuizResultFilter},
        stage_attempt::{AttemptFilter, NewStageAttempt},
        user::UpsertUserRequest,
    },
    scoring::ScoreEvaluator,
    storage::{PgStore, Store},
};
use std::sync::Arc;

async fn connect() -> PgStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let config = Config {
        storage_backend: StorageBackend::Postgres,
        database_url: Some(database_url),
        database_max_connections: 4,
        database_connect_retries: 1,
        ..Config::default()
    };
    PgStore::connect(&config)
        .await
        .expect("Failed to connect to Postgres for testing.")
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_attempts_are_append_only_and_newest_first() {
    let store = connect().await;
    let user = unique("pg");

    let mut ids = Vec::new();
    for score in [20.0, 15.0] {
        let record = store
            .insert_stage_attempt(&NewStageAttempt {
                user_id: user.clone(),
                stage: "concern".to_string(),
                answers: vec![serde_json::json!(5), serde_json::json!("b")],
                score,
                passed: score >= 18.0,
            })
            .await
            .unwrap();
        ids.push(record.id);
    }

    let listed = store
        .list_stage_attempts(&AttemptFilter::for_user(user.as_str()))
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, ids[1]);
    assert_eq!(listed[0].answers[1], "b");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_progress_upsert_is_keyed_by_level() {
    let store = Arc::new(connect().await);
    let user = unique("pg");

    let missing = store
        .upsert_progress(&user, &Progress::stamped("concern", 1.0, true, chrono::Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::UserNotFound(_)));

    store.upsert_user(&user, &UpsertUserRequest::default()).await.unwrap();

    let mut handles = Vec::new();
    for level in ["concern", "control", "curiosity", "confidence", "concern"] {
        let store = store.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            store
                .upsert_progress(&user, &Progress::stamped(level, 10.0, true, chrono::Utc::now()))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let progress = store.get_progress(&user).await.unwrap();
    assert_eq!(progress.len(), 4);

    let first = progress
        .iter()
        .find(|p| p.level_id == "concern")
        .and_then(|p| p.completed_at)
        .unwrap();
    let later = first + chrono::TimeDelta::minutes(5);
    let progress = store
        .upsert_progress(&user, &Progress::stamped("concern", 12.0, true, later))
        .await
        .unwrap();
    let concern = progress.iter().find(|p| p.level_id == "concern").unwrap();
    assert_eq!(concern.score, 12.0);
    assert_eq!(concern.completed_at, Some(first));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_quiz_results_round_trip() {
    let store = connect().await;
    let user = unique("pg");
    let answers = CareerAnswers {
        concern: vec![5; 6],
        ..Default::default()
    }
    .normalized();
    let evaluation = ScoreEvaluator::default().evaluate(&answers);

    let stored = store
        .insert_quiz_result(&career_journey::models::quiz_result::NewQuizResult {
            user_id: user.clone(),
            answers: answers.clone(),
            scores: evaluation.scores,
            total: evaluation.total,
            percent: evaluation.percent,
            category: evaluation.category.clone(),
            is_posttest: true,
        })
        .await
        .unwrap();

    let listed = store
        .list_quiz_results(&QuizResultFilter {
            user_id: Some(user),
            is_posttest: Some(true),
        })
        .await
        .unwrap();
    assert_eq!(listed, vec![stored]);
    assert_eq!(listed[0].answers, answers);
    assert_eq!(listed[0].total, 30);
}
