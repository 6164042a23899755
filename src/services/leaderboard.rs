// src/services/leaderboard.rs

use std::{cmp::Ordering, collections::HashMap};

use crate::{
    config::{DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT},
    error::AppError,
    models::quiz_result::{LeaderboardEntry, QuizResult, QuizResultFilter},
    storage::Storage,
};

pub const ANONYMOUS_USERNAME: &str = "Anonymous";

/// Ranks users by their best posttest. Recomputed on every call.
#[derive(Clone)]
pub struct LeaderboardAggregator {
    storage: Storage,
    default_limit: usize,
    max_limit: usize,
}

impl LeaderboardAggregator {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            default_limit: DEFAULT_LEADERBOARD_LIMIT,
            max_limit: MAX_LEADERBOARD_LIMIT,
        }
    }

    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit.max(1);
        self
    }

    pub async fn compute_leaderboard(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let limit = limit.unwrap_or(self.default_limit).min(self.max_limit);
        let store = self.storage.store()?;

        let posttests = store.list_quiz_results(&QuizResultFilter::posttests()).await?;
        let mut best = best_per_user(posttests);
        best.sort_by(rank_order);
        best.truncate(limit);

        let mut entries = Vec::with_capacity(best.len());
        for (index, result) in best.into_iter().enumerate() {
            // A failed lookup only costs this entry its name.
            let username = match store.get_user(&result.user_id).await {
                Ok(Some(user)) => user
                    .display_name()
                    .unwrap_or(ANONYMOUS_USERNAME)
                    .to_string(),
                Ok(None) => ANONYMOUS_USERNAME.to_string(),
                Err(e) => {
                    tracing::warn!(
                        user_id = %result.user_id,
                        "Leaderboard username lookup failed: {}",
                        e
                    );
                    ANONYMOUS_USERNAME.to_string()
                }
            };

            entries.push(LeaderboardEntry {
                rank: index + 1,
                user_id: result.user_id,
                username,
                total: result.total,
                percent: result.percent,
            });
        }

        Ok(entries)
    }
}

/// Keeps each user's highest-total result. Equal totals keep the earlier one.
///
/// `results` must be newest first, as the store lists them. On equal
/// timestamps a later element was stored earlier, so it replaces the current.
pub fn best_per_user(results: Vec<QuizResult>) -> Vec<QuizResult> {
    let mut best: HashMap<String, QuizResult> = HashMap::new();

    for result in results {
        match best.get(&result.user_id) {
            Some(current)
                if current.total > result.total
                    || (current.total == result.total && current.created_at < result.created_at) => {}
            _ => {
                best.insert(result.user_id.clone(), result);
            }
        }
    }

    best.into_values().collect()
}

/// Total descending, then earliest result, then user id.
fn rank_order(a: &QuizResult, b: &QuizResult) -> Ordering {
    b.total
        .cmp(&a.total)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            progress::Progress,
            quiz_result::{CareerAnswers, CategoryScores, NewQuizResult},
            stage_attempt::{AttemptFilter, NewStageAttempt, StageAttempt},
            user::{UpsertUserRequest, User},
        },
        scoring::percent_of,
        storage::{MemoryStore, Store},
    };
    use async_trait::async_trait;
    use chrono::{TimeDelta, Utc};

    fn result(user_id: &str, total: i32, offset_secs: i64) -> QuizResult {
        QuizResult {
            id: uuid::Uuid::new_v4(),
            user_id: user_id.to_string(),
            answers: CareerAnswers::default().normalized(),
            scores: CategoryScores::default(),
            total,
            percent: percent_of(total),
            category: "moderate".to_string(),
            is_posttest: true,
            created_at: Utc::now() + TimeDelta::seconds(offset_secs),
        }
    }

    async fn seed(store: &dyn Store, user_id: &str, total: i32, is_posttest: bool) {
        store
            .insert_quiz_result(&NewQuizResult {
                user_id: user_id.to_string(),
                answers: CareerAnswers::default().normalized(),
                scores: CategoryScores::default(),
                total,
                percent: percent_of(total),
                category: "moderate".to_string(),
                is_posttest,
            })
            .await
            .unwrap();
    }

    async fn name(store: &dyn Store, user_id: &str, username: Option<&str>, email: Option<&str>) {
        store
            .upsert_user(
                user_id,
                &UpsertUserRequest {
                    username: username.map(str::to_string),
                    email: email.map(str::to_string),
                    role: None,
                },
            )
            .await
            .unwrap();
    }

    #[test]
    fn test_best_per_user_keeps_maximum() {
        let best = best_per_user(vec![
            result("a", 80, 0),
            result("a", 100, 1),
            result("a", 90, 2),
            result("b", 70, 0),
        ]);
        assert_eq!(best.len(), 2);
        let a = best.iter().find(|r| r.user_id == "a").unwrap();
        assert_eq!(a.total, 100);
    }

    #[test]
    fn test_best_per_user_tie_keeps_earliest() {
        let early = result("a", 90, -10);
        let late = result("a", 90, 0);
        // Newest first, as the store returns them.
        let best = best_per_user(vec![late, early.clone()]);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].id, early.id);
    }

    #[test]
    fn test_best_per_user_same_timestamp_keeps_first_stored() {
        let stored_first = result("a", 90, 0);
        let stored_second = QuizResult {
            id: uuid::Uuid::new_v4(),
            ..stored_first.clone()
        };
        let best = best_per_user(vec![stored_second, stored_first.clone()]);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].id, stored_first.id);
    }

    #[test]
    fn test_rank_order_breaks_ties_by_time_then_user() {
        let base = Utc::now();
        let at = |user_id: &str, total: i32, offset_secs: i64| QuizResult {
            created_at: base + TimeDelta::seconds(offset_secs),
            ..result(user_id, total, 0)
        };
        let mut results = vec![at("c", 90, 5), at("b", 100, 0), at("a", 90, 5), at("d", 90, -5)];
        results.sort_by(rank_order);

        let order: Vec<&str> = results.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[tokio::test]
    async fn test_leaderboard_ranks_best_posttests() {
        let storage = Storage::memory();
        let store = storage.store().unwrap();
        seed(store, "a", 100, true).await;
        seed(store, "a", 110, true).await;
        seed(store, "a", 120, false).await; // pretests never count
        seed(store, "b", 105, true).await;
        seed(store, "c", 60, false).await;
        name(store, "a", Some("ana"), None).await;
        name(store, "b", None, Some("bo@example.com")).await;

        let board = LeaderboardAggregator::new(storage.clone())
            .compute_leaderboard(None)
            .await
            .unwrap();

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].user_id, "a");
        assert_eq!(board[0].username, "ana");
        assert_eq!(board[0].total, 110);
        assert_eq!(board[1].rank, 2);
        assert_eq!(board[1].username, "bo@example.com");
    }

    #[tokio::test]
    async fn test_leaderboard_respects_limit() {
        let storage = Storage::memory();
        let store = storage.store().unwrap();
        for i in 0..15 {
            seed(store, &format!("user{}", i), 30 + i, true).await;
        }

        let board = LeaderboardAggregator::new(storage.clone())
            .compute_leaderboard(Some(10))
            .await
            .unwrap();

        assert_eq!(board.len(), 10);
        let ranks: Vec<usize> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<_>>());
        assert!(board.windows(2).all(|w| w[0].total > w[1].total));
        assert_eq!(board[0].total, 44);
        assert_eq!(board[0].username, ANONYMOUS_USERNAME);
    }

    #[tokio::test]
    async fn test_limit_is_clamped() {
        let storage = Storage::memory();
        let store = storage.store().unwrap();
        for i in 0..5 {
            seed(store, &format!("user{}", i), 50 + i, true).await;
        }

        let board = LeaderboardAggregator::new(storage.clone())
            .with_limits(2, 3)
            .compute_leaderboard(Some(1_000))
            .await
            .unwrap();
        assert_eq!(board.len(), 3);

        let default = LeaderboardAggregator::new(storage)
            .with_limits(2, 3)
            .compute_leaderboard(None)
            .await
            .unwrap();
        assert_eq!(default.len(), 2);
    }

    /// Delegates to a memory store but fails every user lookup.
    struct BrokenDirectory(MemoryStore);

    #[async_trait]
    impl Store for BrokenDirectory {
        async fn get_user(&self, _user_id: &str) -> Result<Option<User>, AppError> {
            Err(AppError::StorageUnavailable("directory offline".to_string()))
        }
        async fn upsert_user(&self, user_id: &str, fields: &UpsertUserRequest) -> Result<User, AppError> {
            self.0.upsert_user(user_id, fields).await
        }
        async fn insert_stage_attempt(&self, attempt: &NewStageAttempt) -> Result<StageAttempt, AppError> {
            self.0.insert_stage_attempt(attempt).await
        }
        async fn list_stage_attempts(&self, filter: &AttemptFilter) -> Result<Vec<StageAttempt>, AppError> {
            self.0.list_stage_attempts(filter).await
        }
        async fn insert_quiz_result(&self, result: &NewQuizResult) -> Result<QuizResult, AppError> {
            self.0.insert_quiz_result(result).await
        }
        async fn list_quiz_results(&self, filter: &QuizResultFilter) -> Result<Vec<QuizResult>, AppError> {
            self.0.list_quiz_results(filter).await
        }
        async fn get_progress(&self, user_id: &str) -> Result<Vec<Progress>, AppError> {
            self.0.get_progress(user_id).await
        }
        async fn upsert_progress(&self, user_id: &str, entry: &Progress) -> Result<Vec<Progress>, AppError> {
            self.0.upsert_progress(user_id, entry).await
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_to_placeholder() {
        let storage = Storage::connected(BrokenDirectory(MemoryStore::new()));
        seed(storage.store().unwrap(), "a", 99, true).await;

        let board = LeaderboardAggregator::new(storage)
            .compute_leaderboard(None)
            .await
            .unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].username, ANONYMOUS_USERNAME);
        assert_eq!(board[0].total, 99);
    }

    #[tokio::test]
    async fn test_unavailable_storage_fails_the_request() {
        let err = LeaderboardAggregator::new(Storage::Unavailable("down".to_string()))
            .compute_leaderboard(None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }
}
