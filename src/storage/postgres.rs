// src/storage/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, postgres::PgPoolOptions, types::Json};

use super::Store;
use crate::{
    config::Config,
    error::AppError,
    models::{
        progress::Progress,
        quiz_result::{CareerAnswers, CategoryScores, NewQuizResult, QuizResult, QuizResultFilter},
        stage_attempt::{AttemptFilter, NewStageAttempt, StageAttempt},
        user::{UpsertUserRequest, User},
    },
};

const USER_COLUMNS: &str = "id, username, email, role, created_at, updated_at";
const ATTEMPT_COLUMNS: &str = "id, user_id, stage, answers, score, passed, created_at";
const QUIZ_COLUMNS: &str = "id, user_id, answers, concern_score, control_score, curiosity_score, \
     confidence_score, total, percent, category, is_posttest, created_at";

#[derive(FromRow)]
struct UserRow {
    id: String,
    username: Option<String>,
    email: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            role: row.role.parse().map_err(AppError::InternalServerError)?,
            id: row.id,
            username: row.username,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ProgressRow {
    level_id: String,
    score: f64,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl From<ProgressRow> for Progress {
    fn from(row: ProgressRow) -> Self {
        Progress {
            level_id: row.level_id,
            score: row.score,
            completed: row.completed,
            // A stamp on an incomplete level is stale data; drop it.
            completed_at: row.completed_at.filter(|_| row.completed),
        }
    }
}

#[derive(FromRow)]
struct StageAttemptRow {
    id: uuid::Uuid,
    user_id: String,
    stage: String,
    answers: Json<Vec<serde_json::Value>>,
    score: f64,
    passed: bool,
    created_at: DateTime<Utc>,
}

impl From<StageAttemptRow> for StageAttempt {
    fn from(row: StageAttemptRow) -> Self {
        StageAttempt {
            id: row.id,
            user_id: row.user_id,
            stage: row.stage,
            answers: row.answers.0,
            score: row.score,
            passed: row.passed,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct QuizResultRow {
    id: uuid::Uuid,
    user_id: String,
    answers: Json<CareerAnswers>,
    concern_score: i32,
    control_score: i32,
    curiosity_score: i32,
    confidence_score: i32,
    total: i32,
    percent: f64,
    category: String,
    is_posttest: bool,
    created_at: DateTime<Utc>,
}

impl From<QuizResultRow> for QuizResult {
    fn from(row: QuizResultRow) -> Self {
        QuizResult {
            id: row.id,
            user_id: row.user_id,
            answers: row.answers.0,
            scores: CategoryScores {
                concern: row.concern_score,
                control: row.control_score,
                curiosity: row.curiosity_score,
                confidence: row.confidence_score,
            },
            total: row.total,
            percent: row.percent,
            category: row.category,
            is_posttest: row.is_posttest,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with retries and applies pending migrations.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let database_url = config
            .database_url
            .as_deref()
            .ok_or_else(|| AppError::StorageUnavailable("DATABASE_URL is not set".to_string()))?;

        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > config.database_connect_retries {
                        return Err(AppError::StorageUnavailable(format!(
                            "Failed to connect to database after {} retries: {}",
                            config.database_connect_retries, e
                        )));
                    }
                    tracing::warn!(
                        "Database not ready, retrying in 2s... (Attempt {})",
                        retry_count
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };
        tracing::info!("Database connected...");

        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        tracing::info!("Migrations applied successfully.");

        Ok(Self::new(pool))
    }

    async fn fetch_progress<'e, E>(executor: E, user_id: &str) -> Result<Vec<Progress>, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT level_id, score, completed, completed_at
            FROM progress
            WHERE user_id = $1
            ORDER BY created_at, level_id
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(Progress::from).collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn upsert_user(
        &self,
        user_id: &str,
        fields: &UpsertUserRequest,
    ) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, username, email, role)
            VALUES ($1, $2, $3, COALESCE($4, 'student'))
            ON CONFLICT (id) DO UPDATE SET
                username = COALESCE($2, users.username),
                email = COALESCE($3, users.email),
                role = COALESCE($4, users.role),
                updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(fields.username.as_deref())
        .bind(fields.email.as_deref())
        .bind(fields.role.map(|r| r.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert user {}: {:?}", user_id, e);
            AppError::from(e)
        })?;

        User::try_from(row)
    }

    async fn insert_stage_attempt(
        &self,
        attempt: &NewStageAttempt,
    ) -> Result<StageAttempt, AppError> {
        let row = sqlx::query_as::<_, StageAttemptRow>(&format!(
            r#"
            INSERT INTO stage_attempts (id, user_id, stage, answers, score, passed)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ATTEMPT_COLUMNS
        ))
        .bind(uuid::Uuid::new_v4())
        .bind(&attempt.user_id)
        .bind(&attempt.stage)
        .bind(Json(&attempt.answers))
        .bind(attempt.score)
        .bind(attempt.passed)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_stage_attempts(
        &self,
        filter: &AttemptFilter,
    ) -> Result<Vec<StageAttempt>, AppError> {
        let mut query_builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM stage_attempts WHERE TRUE",
            ATTEMPT_COLUMNS
        ));
        if let Some(user_id) = &filter.user_id {
            query_builder.push(" AND user_id = ").push_bind(user_id.clone());
        }
        if let Some(stage) = &filter.stage {
            query_builder.push(" AND stage = ").push_bind(stage.clone());
        }
        query_builder.push(" ORDER BY created_at DESC, seq DESC");

        let rows: Vec<StageAttemptRow> = query_builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(StageAttempt::from).collect())
    }

    async fn insert_quiz_result(&self, result: &NewQuizResult) -> Result<QuizResult, AppError> {
        let row = sqlx::query_as::<_, QuizResultRow>(&format!(
            r#"
            INSERT INTO quiz_results (
                id, user_id, answers,
                concern_score, control_score, curiosity_score, confidence_score,
                total, percent, category, is_posttest
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            QUIZ_COLUMNS
        ))
        .bind(uuid::Uuid::new_v4())
        .bind(&result.user_id)
        .bind(Json(&result.answers))
        .bind(result.scores.concern)
        .bind(result.scores.control)
        .bind(result.scores.curiosity)
        .bind(result.scores.confidence)
        .bind(result.total)
        .bind(result.percent)
        .bind(&result.category)
        .bind(result.is_posttest)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_quiz_results(
        &self,
        filter: &QuizResultFilter,
    ) -> Result<Vec<QuizResult>, AppError> {
        let mut query_builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM quiz_results WHERE TRUE",
            QUIZ_COLUMNS
        ));
        if let Some(user_id) = &filter.user_id {
            query_builder.push(" AND user_id = ").push_bind(user_id.clone());
        }
        if let Some(is_posttest) = filter.is_posttest {
            query_builder.push(" AND is_posttest = ").push_bind(is_posttest);
        }
        query_builder.push(" ORDER BY created_at DESC, seq DESC");

        let rows: Vec<QuizResultRow> = query_builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(QuizResult::from).collect())
    }

    async fn get_progress(&self, user_id: &str) -> Result<Vec<Progress>, AppError> {
        Self::fetch_progress(&self.pool, user_id).await
    }

    /// Locks the owning user row for the duration of the transaction, so
    /// concurrent upserts for one user are applied one after another.
    async fn upsert_progress(
        &self,
        user_id: &str,
        entry: &Progress,
    ) -> Result<Vec<Progress>, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::UserNotFound(format!(
                "User '{}' not found",
                user_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO progress (user_id, level_id, score, completed, completed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, level_id) DO UPDATE SET
                score = EXCLUDED.score,
                completed = EXCLUDED.completed,
                completed_at = CASE
                    WHEN progress.completed AND EXCLUDED.completed
                        THEN COALESCE(progress.completed_at, EXCLUDED.completed_at)
                    ELSE EXCLUDED.completed_at
                END,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(&entry.level_id)
        .bind(entry.score)
        .bind(entry.completed)
        .bind(entry.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert progress for {}: {:?}", user_id, e);
            AppError::from(e)
        })?;

        let progress = Self::fetch_progress(&mut *tx, user_id).await?;
        tx.commit().await?;

        Ok(progress)
    }
}
