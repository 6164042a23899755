// src/storage/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use super::Store;
use crate::{
    error::AppError,
    models::{
        progress::{Progress, upsert_into},
        quiz_result::{NewQuizResult, QuizResult, QuizResultFilter},
        stage_attempt::{AttemptFilter, NewStageAttempt, StageAttempt},
        user::{UpsertUserRequest, User},
    },
};

/// A user document: profile plus its embedded progress list.
#[derive(Debug, Clone)]
struct UserDoc {
    user: User,
    progress: Vec<Progress>,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, UserDoc>,
    // Append-only logs, kept in insertion order.
    attempts: Vec<StageAttempt>,
    quiz_results: Vec<QuizResult>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// Wall-clock time, nudged forward so that records never share a timestamp.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

/// Process-local store. Every mutation happens under one write lock, so a
/// progress upsert is a single atomic read-modify-write per call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(user_id).map(|doc| doc.user.clone()))
    }

    async fn upsert_user(
        &self,
        user_id: &str,
        fields: &UpsertUserRequest,
    ) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;
        let now = inner.next_timestamp();

        let doc = inner
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserDoc {
                user: User {
                    id: user_id.to_string(),
                    username: None,
                    email: None,
                    role: Default::default(),
                    created_at: now,
                    updated_at: now,
                },
                progress: Vec::new(),
            });

        if let Some(username) = &fields.username {
            doc.user.username = Some(username.clone());
        }
        if let Some(email) = &fields.email {
            doc.user.email = Some(email.clone());
        }
        if let Some(role) = fields.role {
            doc.user.role = role;
        }
        doc.user.updated_at = now;

        Ok(doc.user.clone())
    }

    async fn insert_stage_attempt(
        &self,
        attempt: &NewStageAttempt,
    ) -> Result<StageAttempt, AppError> {
        let mut inner = self.inner.write().await;
        let record = StageAttempt {
            id: uuid::Uuid::new_v4(),
            user_id: attempt.user_id.clone(),
            stage: attempt.stage.clone(),
            answers: attempt.answers.clone(),
            score: attempt.score,
            passed: attempt.passed,
            created_at: inner.next_timestamp(),
        };
        inner.attempts.push(record.clone());
        Ok(record)
    }

    async fn list_stage_attempts(
        &self,
        filter: &AttemptFilter,
    ) -> Result<Vec<StageAttempt>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .attempts
            .iter()
            .rev()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn insert_quiz_result(&self, result: &NewQuizResult) -> Result<QuizResult, AppError> {
        let mut inner = self.inner.write().await;
        let record = QuizResult {
            id: uuid::Uuid::new_v4(),
            user_id: result.user_id.clone(),
            answers: result.answers.clone(),
            scores: result.scores,
            total: result.total,
            percent: result.percent,
            category: result.category.clone(),
            is_posttest: result.is_posttest,
            created_at: inner.next_timestamp(),
        };
        inner.quiz_results.push(record.clone());
        Ok(record)
    }

    async fn list_quiz_results(
        &self,
        filter: &QuizResultFilter,
    ) -> Result<Vec<QuizResult>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .quiz_results
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn get_progress(&self, user_id: &str) -> Result<Vec<Progress>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .get(user_id)
            .map(|doc| doc.progress.clone())
            .unwrap_or_default())
    }

    async fn upsert_progress(
        &self,
        user_id: &str,
        entry: &Progress,
    ) -> Result<Vec<Progress>, AppError> {
        let mut inner = self.inner.write().await;
        let doc = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::UserNotFound(format!("User '{}' not found", user_id)))?;

        upsert_into(&mut doc.progress, entry.clone());
        Ok(doc.progress.clone())
    }
}
